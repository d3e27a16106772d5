/// Events emitted by long-running engine operations.
///
/// A run announces itself with `PhaseStart`, declares its number of progress ticks with
/// `TaskStart`, emits one `TaskIncrement` per report interval and closes with
/// `TaskFinish` followed by `PhaseFinish`.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    /// Snapshot of the trajectory at a report interval.
    Checkpoint { step: usize, time: f64, position: f64 },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn silent_reporter_accepts_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::TaskIncrement);
    }

    #[test]
    fn callback_receives_events_in_order() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|e: Progress| {
            events.lock().unwrap().push(e);
        }));
        reporter.report(Progress::PhaseStart { name: "RT-NEO" });
        reporter.report(Progress::Message("halfway".to_string()));
        drop(reporter);

        assert_eq!(
            events.into_inner().unwrap(),
            vec![
                Progress::PhaseStart { name: "RT-NEO" },
                Progress::Message("halfway".to_string())
            ]
        );
    }
}
