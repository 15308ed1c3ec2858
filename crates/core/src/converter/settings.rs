//! Fixed MP3 output settings and working-storage naming.

/// Stem of the working-storage entry holding the input bytes.
pub const INPUT_STEM: &str = "input";

/// Working-storage entry the engine writes the MP3 to.
pub const OUTPUT_STORAGE_NAME: &str = "output.mp3";

/// Encoding parameters of every conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mp3Settings {
    pub bitrate_kbps: u32,
    pub sample_rate_hz: u32,
    pub channels: u8,
}

/// Stereo, 44.1 kHz, 192 kbps constant bitrate.
pub const MP3_SETTINGS: Mp3Settings = Mp3Settings {
    bitrate_kbps: 192,
    sample_rate_hz: 44_100,
    channels: 2,
};

impl Mp3Settings {
    /// Engine arguments converting `input` to an audio-only MP3 at `output`.
    pub fn args(&self, input: &str, output: &str) -> Vec<String> {
        vec![
            "-i".to_string(),
            input.to_string(),
            "-vn".to_string(), // Drop video
            "-ar".to_string(),
            self.sample_rate_hz.to_string(),
            "-ac".to_string(),
            self.channels.to_string(),
            "-b:a".to_string(),
            format!("{}k", self.bitrate_kbps),
            output.to_string(),
        ]
    }
}

/// Working-storage name for an input called `file_name`.
///
/// Keeps the original extension so the engine can infer the container.
pub fn input_storage_name(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) if is_plain_extension(&file_name[idx + 1..]) => {
            format!("{}{}", INPUT_STEM, &file_name[idx..])
        }
        _ => INPUT_STEM.to_string(),
    }
}

/// Download name for the MP3 made from `file_name`.
///
/// A trailing `.<ext>` is replaced by `.mp3`; names without one get `.mp3`
/// appended.
pub fn output_file_name(file_name: &str) -> String {
    let base = match file_name.rfind('.') {
        Some(idx) if is_plain_extension(&file_name[idx + 1..]) => &file_name[..idx],
        _ => file_name,
    };
    format!("{}.mp3", base)
}

fn is_plain_extension(ext: &str) -> bool {
    !ext.is_empty() && !ext.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mp3_args() {
        let args = MP3_SETTINGS.args("input.mkv", OUTPUT_STORAGE_NAME);
        assert_eq!(
            args,
            vec![
                "-i", "input.mkv", "-vn", "-ar", "44100", "-ac", "2", "-b:a", "192k", "output.mp3"
            ]
        );
    }

    #[test]
    fn test_input_storage_name() {
        assert_eq!(input_storage_name("holiday.MOV"), "input.MOV");
        assert_eq!(input_storage_name("my.song.flac"), "input.flac");
        assert_eq!(input_storage_name("noextension"), "input");
        assert_eq!(input_storage_name("trailing."), "input");
        assert_eq!(input_storage_name("dir.d/file"), "input");
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("holiday.mov"), "holiday.mp3");
        assert_eq!(output_file_name("my.song.flac"), "my.song.mp3");
        assert_eq!(output_file_name("noextension"), "noextension.mp3");
        assert_eq!(output_file_name("track.mp3"), "track.mp3");
        assert_eq!(output_file_name(".hidden"), ".mp3");
    }
}
