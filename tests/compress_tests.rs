// Tests for the size-constrained re-encoding path: the bitrate formula and
// (where ffmpeg is available) the compressed-output size property.

use whisper_relay::compress::{
    calculate_bitrate, CompressError, Compressor, MAX_UPLOAD_BYTES, TARGET_SIZE_KB,
};

#[test]
fn test_bitrate_matches_formula() {
    // floor((24.9 * 1024 * 8) / (1.048576 * 60)) = floor(3242.18...)
    let bitrate = calculate_bitrate(60.0, 24.9 * 1024.0).unwrap();
    assert_eq!(bitrate, 3242);
}

#[test]
fn test_bitrate_positive_over_realistic_inputs() {
    for duration in [1.0, 10.0, 60.0, 600.0, 3600.0] {
        for target_kb in [1024.0, 5.0 * 1024.0, TARGET_SIZE_KB] {
            let bitrate = calculate_bitrate(duration, target_kb).unwrap();
            assert!(
                bitrate > 0,
                "bitrate should be positive for duration={}, target={}",
                duration,
                target_kb
            );
        }
    }
}

#[test]
fn test_bitrate_non_increasing_in_duration() {
    let durations = [10.0, 30.0, 60.0, 120.0, 600.0, 3600.0];
    let mut previous = u32::MAX;
    for duration in durations {
        let bitrate = calculate_bitrate(duration, TARGET_SIZE_KB).unwrap();
        assert!(
            bitrate <= previous,
            "bitrate should not increase with duration ({}s gave {} after {})",
            duration,
            bitrate,
            previous
        );
        previous = bitrate;
    }
}

#[test]
fn test_bitrate_non_decreasing_in_target_size() {
    let targets = [512.0, 1024.0, 8192.0, TARGET_SIZE_KB];
    let mut previous = 0u32;
    for target_kb in targets {
        let bitrate = calculate_bitrate(60.0, target_kb).unwrap();
        assert!(
            bitrate >= previous,
            "bitrate should not decrease with target size ({} KB gave {} after {})",
            target_kb,
            bitrate,
            previous
        );
        previous = bitrate;
    }
}

#[test]
fn test_bitrate_rejects_zero_duration() {
    let result = calculate_bitrate(0.0, TARGET_SIZE_KB);
    assert!(matches!(result, Err(CompressError::ZeroDuration)));

    let result = calculate_bitrate(-1.0, TARGET_SIZE_KB);
    assert!(matches!(result, Err(CompressError::ZeroDuration)));
}

#[test]
fn test_upload_limit_constants() {
    assert_eq!(MAX_UPLOAD_BYTES, 25 * 1024 * 1024);
    // Target sits under the limit to leave upload margin
    assert!((TARGET_SIZE_KB * 1024.0) < MAX_UPLOAD_BYTES as f64);
}

/// For an input over the 25 MB limit, the re-encoded output must come in at
/// or under the limit (small container-overhead tolerance allowed).
///
/// 650s of 22050 Hz mono PCM is ~28.7 MB, and the computed bitrate (~299
/// kbps) stays inside the MP3 encoder's valid range.
#[tokio::test]
#[ignore = "requires ffmpeg on PATH and ~30 MB of temp space"]
async fn test_compressed_output_fits_upload_limit() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let input = dir.path().join("oversized.wav");

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 22050,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&input, spec).expect("failed to create WAV");
    for _ in 0..(22050u64 * 650) {
        writer.write_sample(0i16).expect("failed to write sample");
    }
    writer.finalize().expect("failed to finalize WAV");

    let input_size = std::fs::metadata(&input).expect("failed to stat input").len();
    assert!(
        input_size > MAX_UPLOAD_BYTES,
        "fixture must exceed the upload limit ({} bytes)",
        input_size
    );

    let duration = 650.0;
    let bitrate = calculate_bitrate(duration, TARGET_SIZE_KB).unwrap();

    let compressor = Compressor::discover().expect("ffmpeg not found on PATH");
    let compressed = compressor
        .compress_to_mp3(&input, bitrate)
        .await
        .expect("compression failed");

    let compressed_size = std::fs::metadata(compressed.path())
        .expect("failed to stat output")
        .len();
    let tolerance = 512 * 1024; // container overhead
    assert!(
        compressed_size <= MAX_UPLOAD_BYTES + tolerance,
        "compressed output ({} bytes) should fit the upload limit",
        compressed_size
    );

    // Round-trip: the re-encoded clip keeps its duration within codec tolerance
    let decoded = whisper_relay::AudioFile::open(compressed.path()).expect("failed to decode MP3");
    assert!(
        (decoded.duration_seconds - duration).abs() < 2.0,
        "round-trip duration {:.1}s should match original {:.1}s",
        decoded.duration_seconds,
        duration
    );
}
