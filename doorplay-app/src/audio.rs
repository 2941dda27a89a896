use doorplay_core::{AssetPaths, SoundKind, SoundTable, existing_asset};

/// Plays sound cues. Without the `audio` feature, or without an output
/// device, cues are only logged.
pub struct CuePlayer {
    assets: AssetPaths,
    table: SoundTable,
    #[cfg(feature = "audio")]
    output: Option<(rodio::OutputStream, rodio::OutputStreamHandle)>,
}

impl CuePlayer {
    pub fn new(assets: AssetPaths, table: SoundTable) -> Self {
        #[cfg(feature = "audio")]
        let output = match rodio::OutputStream::try_default() {
            Ok(output) => Some(output),
            Err(err) => {
                log::warn!("no audio output, sound cues will be logged: {err}");
                None
            }
        };

        Self {
            assets,
            table,
            #[cfg(feature = "audio")]
            output,
        }
    }

    pub fn play(&self, kind: SoundKind) {
        let path = self.assets.sound(&self.table, kind);
        let Some(path) = existing_asset(&path) else {
            return;
        };

        #[cfg(feature = "audio")]
        {
            if let Some((_, handle)) = &self.output {
                if let Err(err) = play_file(handle, path) {
                    log::warn!("sound {} could not be played: {err}", path.display());
                }
                return;
            }
        }

        log::info!("Sound cue {kind:?}: {}", path.display());
    }

    pub fn play_all(&self, cues: impl IntoIterator<Item = SoundKind>) {
        for kind in cues {
            self.play(kind);
        }
    }
}

#[cfg(feature = "audio")]
fn play_file(handle: &rodio::OutputStreamHandle, path: &std::path::Path) -> anyhow::Result<()> {
    use std::io::BufReader;

    let sink = rodio::Sink::try_new(handle)?;
    let file = std::fs::File::open(path)?;
    sink.append(rodio::Decoder::new(BufReader::new(file))?);
    sink.detach();
    Ok(())
}
