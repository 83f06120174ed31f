#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    BatchStart { total: u64 },
    ItemFinished,
    BatchFinish,
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
    fn reporter_forwards_events_to_callback() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            events.lock().unwrap().push(event);
        }));
        reporter.report(Progress::BatchStart { total: 2 });
        reporter.report(Progress::ItemFinished);
        reporter.report(Progress::BatchFinish);
        drop(reporter);
        assert_eq!(
            events.into_inner().unwrap(),
            vec![
                Progress::BatchStart { total: 2 },
                Progress::ItemFinished,
                Progress::BatchFinish
            ]
        );
    }

    #[test]
    fn reporter_without_callback_is_silent() {
        ProgressReporter::new().report(Progress::ItemFinished);
    }
}
