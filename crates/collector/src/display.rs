//! SampleDisplay - where samples and notices are rendered

use std::sync::{Mutex, PoisonError};

use contracts::{Field, Sample};
use tracing::{info, warn};

use crate::notice::{Notice, NoticeBoard, NoticeLevel, NoticeTtl};

/// Display sink for the collection loop
///
/// `show` runs synchronously inside the tick; `notify` is called from
/// delivery tasks.
pub trait SampleDisplay: Send + Sync {
    /// Render a freshly assembled sample
    fn show(&self, sample: &Sample);

    /// Post a transient notice
    fn notify(&self, notice: Notice);

    /// Collection was stopped by the user
    fn session_stopped(&self);
}

/// Renders through tracing and keeps a notice board
#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    board: NoticeBoard,
}

impl ConsoleDisplay {
    pub fn new(ttl: NoticeTtl) -> Self {
        Self {
            board: NoticeBoard::new(ttl),
        }
    }

    pub fn board(&self) -> &NoticeBoard {
        &self.board
    }
}

fn describe<T>(field: &Field<T>, render: impl FnOnce(&T) -> String) -> String {
    match field {
        Field::Live { value } => render(value),
        Field::Synthetic { value, reason } => {
            format!("{} (synthetic: {reason})", render(value))
        }
    }
}

impl SampleDisplay for ConsoleDisplay {
    fn show(&self, sample: &Sample) {
        info!(
            captured_at = sample.captured_at,
            instance_id = %sample.instance_id,
            geolocation = %describe(&sample.geolocation, |g| format!(
                "lat={:.5} lon={:.5} ±{:.0}m",
                g.latitude, g.longitude, g.accuracy
            )),
            ambient_light = %describe(&sample.ambient_light, |l| format!("{:.2} lux", l.illuminance_lux)),
            orientation = %describe(&sample.orientation, |o| format!(
                "α={:.1} β={:.1} γ={:.1}",
                o.alpha, o.beta, o.gamma
            )),
            battery = %describe(&sample.battery, |b| format!(
                "{:.0}%{}",
                b.level * 100.0,
                if b.charging { " charging" } else { "" }
            )),
            "sample"
        );
    }

    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!(message = %notice.message, "notice"),
            NoticeLevel::Failure => warn!(message = %notice.message, "notice"),
        }
        self.board.post(notice);
    }

    fn session_stopped(&self) {
        info!("Data collection stopped");
    }
}

/// Display event, as recorded by `MemoryDisplay`
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Sample(Sample),
    Notice(Notice),
    Stopped,
}

/// Headless display that records every event
#[derive(Debug, Default)]
pub struct MemoryDisplay {
    events: Mutex<Vec<DisplayEvent>>,
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DisplayEvent> {
        self.lock().clone()
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                DisplayEvent::Sample(sample) => Some(sample.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                DisplayEvent::Notice(notice) => Some(notice.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DisplayEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SampleDisplay for MemoryDisplay {
    fn show(&self, sample: &Sample) {
        self.lock().push(DisplayEvent::Sample(sample.clone()));
    }

    fn notify(&self, notice: Notice) {
        self.lock().push(DisplayEvent::Notice(notice));
    }

    fn session_stopped(&self) {
        self.lock().push(DisplayEvent::Stopped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::LightLevel;

    #[test]
    fn test_describe_marks_synthetic() {
        let live = Field::live(LightLevel::rounded(1.5));
        let synthetic = Field::synthetic(LightLevel::rounded(2.0), "no sensor");
        let render = |l: &LightLevel| format!("{:.2} lux", l.illuminance_lux);

        assert_eq!(describe(&live, render), "1.50 lux");
        assert_eq!(
            describe(&synthetic, render),
            "2.00 lux (synthetic: no sensor)"
        );
    }

    #[tokio::test]
    async fn test_console_notify_posts_to_board() {
        let display = ConsoleDisplay::new(NoticeTtl::default());
        display.notify(Notice::failure("Error sending data: refused"));
        assert_eq!(display.board().active().len(), 1);
    }
}
