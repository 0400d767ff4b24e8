use super::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Minimal PCM WAV: mono, 16-bit, 8 kHz, `secs` seconds of silence.
pub(crate) fn silent_wav(secs: u32) -> Vec<u8> {
    let sample_rate: u32 = 8_000;
    let byte_rate = sample_rate * 2;
    let data_len = byte_rate * secs;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes()); // block align
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);
    out
}

#[test]
fn metadata_for_unreadable_audio_is_exactly_the_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("junk.dat");
    fs::write(&path, b"definitely not audio").unwrap();

    let id = TrackId::from("junk.dat");
    let meta = read_metadata(&path, &id);

    assert_eq!(meta.duration, "180");
    assert_eq!(meta.bitrate, "192000");
    assert_eq!(meta.total_bytes, "0");
    assert_eq!(meta.track_name, "junk.dat");
    assert_eq!(meta.artist, "Unknown Artist");
    assert_eq!(meta.album, "Unknown Album");
    assert_eq!(meta, TrackMetadata::defaults_for(&id));
}

#[test]
fn metadata_for_missing_file_degrades_instead_of_failing() {
    let id = TrackId::from("ghost.mp3");
    let meta = read_metadata(Path::new("/definitely/not/here/ghost.mp3"), &id);
    assert_eq!(meta, TrackMetadata::defaults_for(&id));
}

#[test]
fn metadata_reads_real_audio_properties() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    let bytes = silent_wav(2);
    fs::write(&path, &bytes).unwrap();

    let meta = read_metadata(&path, &TrackId::from("tone.wav"));
    assert_eq!(meta.duration, "2");
    assert_eq!(meta.bitrate, "128000");
    assert_eq!(meta.total_bytes, bytes.len().to_string());
    assert_eq!(meta.track_name, "tone.wav");
    assert_eq!(meta.artist, "Unknown Artist");
}

#[test]
fn metadata_prefers_embedded_artist_and_album_tags() {
    use lofty::config::WriteOptions;
    use lofty::prelude::*;
    use lofty::tag::{Tag, TagType};

    let dir = tempdir().unwrap();
    let path = dir.path().join("tagged.wav");
    fs::write(&path, silent_wav(1)).unwrap();

    let mut tag = Tag::new(TagType::Id3v2);
    tag.set_artist("Nina Simone".into());
    tag.set_album("  Pastel Blues ".into());
    tag.save_to_path(&path, WriteOptions::default()).unwrap();

    let meta = read_metadata(&path, &TrackId::from("tagged.wav"));
    assert_eq!(meta.artist, "Nina Simone");
    assert_eq!(meta.album, "Pastel Blues");
    assert_eq!(meta.track_name, "tagged.wav");
    assert_eq!(meta.duration, "1");
}

#[test]
fn metadata_ignores_blank_tags() {
    use lofty::config::WriteOptions;
    use lofty::prelude::*;
    use lofty::tag::{Tag, TagType};

    let dir = tempdir().unwrap();
    let path = dir.path().join("blank.wav");
    fs::write(&path, silent_wav(1)).unwrap();

    let mut tag = Tag::new(TagType::Id3v2);
    tag.set_artist("   ".into());
    tag.save_to_path(&path, WriteOptions::default()).unwrap();

    let meta = read_metadata(&path, &TrackId::from("blank.wav"));
    assert_eq!(meta.artist, "Unknown Artist");
    assert_eq!(meta.album, "Unknown Album");
}

#[test]
fn metadata_serializes_with_wire_field_names() {
    let meta = TrackMetadata::defaults_for(&TrackId::from("a.mp3"));
    let json = serde_json::to_value(&meta).unwrap();
    assert_eq!(json["Duration"], "180");
    assert_eq!(json["Bitrate"], "192000");
    assert_eq!(json["TotalBytes"], "0");
    assert_eq!(json["TrackName"], "a.mp3");
    assert_eq!(json["Artist"], "Unknown Artist");
    assert_eq!(json["Album"], "Unknown Album");
}

#[test]
fn metadata_numeric_accessors_fall_back_to_defaults() {
    let mut meta = TrackMetadata::defaults_for(&TrackId::from("a.mp3"));
    meta.duration = "n/a".into();
    meta.bitrate = "".into();
    assert_eq!(meta.duration_seconds(), 180);
    assert_eq!(meta.bitrate_bps(), 192_000);
}

#[test]
fn track_id_extension_is_used_for_local_copies() {
    assert_eq!(
        TrackId::from("song.mp3").dotted_extension().as_deref(),
        Some(".mp3")
    );
    assert_eq!(TrackId::from("noext").dotted_extension(), None);
    assert_eq!(TrackId::from(".hidden").dotted_extension(), None);
}
