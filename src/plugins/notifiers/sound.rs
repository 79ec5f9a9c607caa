use async_trait::async_trait;
use std::time::Duration;

use crate::plugins::traits::{NotifierSink, PurchaseAlert};
use crate::utils::error::AppError;

const ALERT_FREQUENCY_HZ: f32 = 800.0;

/// Plays an alert tone for the configured duration.
///
/// With the `sound` feature the tone goes through the default audio device;
/// without it the terminal bell is rung and the duration waited out.
pub struct SoundNotifier {
    frequency: f32,
}

impl Default for SoundNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundNotifier {
    pub fn new() -> Self {
        Self {
            frequency: ALERT_FREQUENCY_HZ,
        }
    }
}

#[async_trait]
impl NotifierSink for SoundNotifier {
    fn name(&self) -> &str {
        "sound"
    }

    async fn notify(&self, alert: &PurchaseAlert) -> Result<(), AppError> {
        if alert.alert_duration_ms == 0 {
            return Ok(());
        }

        let frequency = self.frequency;
        let duration = Duration::from_millis(alert.alert_duration_ms);
        tokio::task::spawn_blocking(move || play_tone(frequency, duration))
            .await
            .map_err(|e| AppError::Internal(format!("Alert tone task failed: {}", e)))?
    }
}

#[cfg(feature = "sound")]
fn play_tone(frequency: f32, duration: Duration) -> Result<(), AppError> {
    use rodio::{OutputStreamBuilder, Sink, Source};

    let mut stream = OutputStreamBuilder::open_default_stream().map_err(|e| AppError::Notifier {
        notifier: "sound".to_string(),
        message: format!("No audio output available: {}", e),
    })?;
    stream.log_on_drop(false);

    let sink = Sink::connect_new(stream.mixer());
    let tone = rodio::source::SineWave::new(frequency)
        .take_duration(duration)
        .amplify(0.20);
    sink.append(tone);
    sink.sleep_until_end();
    Ok(())
}

#[cfg(not(feature = "sound"))]
fn play_tone(_frequency: f32, duration: Duration) -> Result<(), AppError> {
    use std::io::Write;

    let mut stdout = std::io::stdout();
    stdout.write_all(b"\x07")?;
    stdout.flush()?;
    std::thread::sleep(duration);
    Ok(())
}
