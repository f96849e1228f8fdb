//! Announcing a finished timer: desktop notification and sound, in parallel.

use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{info, warn};
use playtimer_lib::constants::{APP_ID, APP_NAME};
use rodio::source::{SineWave, Source};
use rodio::{Decoder, OutputStreamBuilder, Sink};
use zbus::zvariant::Value;

/// Critical urgency keeps the notification on screen until dismissed.
const URGENCY_CRITICAL: u8 = 2;

/// Tones of the built-in chime, in Hz, played in order.
const CHIME_TONES: [f32; 3] = [880.0, 1174.7, 1568.0];
const CHIME_TONE_LENGTH: Duration = Duration::from_millis(220);

/// Sound played at completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sound {
    /// Generated chime, used when no file is given.
    Chime,
    File(PathBuf),
}

/// What to do once the countdown completes.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub title: String,
    pub text: String,
    pub notify: bool,
    pub sound: Option<Sound>,
    pub volume: f32,
}

impl Completion {
    /// Run every requested announcement and wait for all of them.
    pub fn announce(&self) {
        thread::scope(|scope| {
            if self.notify {
                info!("notification requested");
                scope.spawn(|| {
                    if let Err(err) = send_notification(&self.title, &self.text) {
                        warn!("sending notification: {}", err);
                    }
                });
            }
            if let Some(sound) = &self.sound {
                info!("sound requested: {:?}", sound);
                scope.spawn(move || {
                    if let Err(err) = play_sound(sound, self.volume) {
                        warn!("playing sound: {}", err);
                    }
                });
            }
        });
    }
}

fn send_notification(title: &str, text: &str) -> Result<(), Box<dyn Error>> {
    let connection = zbus::blocking::Connection::session()?;
    let mut hints: HashMap<&str, Value> = HashMap::new();
    hints.insert("urgency", Value::from(URGENCY_CRITICAL));
    hints.insert("desktop-entry", Value::from(APP_ID));

    let reply = connection.call_method(
        Some("org.freedesktop.Notifications"),
        "/org/freedesktop/Notifications",
        Some("org.freedesktop.Notifications"),
        "Notify",
        &(
            APP_NAME,
            0u32,
            "alarm-symbolic",
            title,
            text,
            Vec::<&str>::new(),
            hints,
            -1i32,
        ),
    )?;
    let id = reply.body().deserialize::<u32>()?;
    info!("notification {} sent", id);
    Ok(())
}

fn play_sound(sound: &Sound, volume: f32) -> Result<(), Box<dyn Error>> {
    let file = match sound {
        Sound::File(path) => Some(open_sound(path)?),
        Sound::Chime => None,
    };

    let stream = OutputStreamBuilder::open_default_stream()?;
    let sink = Sink::connect_new(stream.mixer());
    sink.set_volume(volume.clamp(0.0, 1.0));
    match file {
        Some(source) => sink.append(source),
        None => {
            for tone in CHIME_TONES {
                sink.append(
                    SineWave::new(tone)
                        .take_duration(CHIME_TONE_LENGTH)
                        .amplify(0.3),
                );
            }
        }
    }
    sink.sleep_until_end();
    Ok(())
}

fn open_sound(path: &Path) -> Result<Decoder<BufReader<File>>, Box<dyn Error>> {
    let file = File::open(path)?;
    Ok(Decoder::new(BufReader::new(file))?)
}
