use crate::image_pipeline::common::error::FlatFieldError;
use crate::image_pipeline::ser::{ByteOrder, ColorId, SerReader};
use crate::image_pipeline::test_utils::{SerLayout, write_ser};

fn frames(count: usize, len: usize) -> Vec<Vec<u16>> {
    (0..count)
        .map(|f| (0..len).map(|i| (f * 1000 + i) as u16).collect())
        .collect()
}

#[test]
fn test_yields_declared_frame_count() {
    let dir = tempfile::tempdir().unwrap();
    let layout = SerLayout::mono16(4, 3);
    let path = write_ser(dir.path(), "cap.ser", &layout, &frames(5, 12));

    let reader = SerReader::open(&path, None).unwrap();
    assert_eq!(reader.header().frame_count, 5);
    assert_eq!(reader.header().observer, "observer");

    let decoded: Vec<_> = reader.frames().unwrap().collect::<Result<_, _>>().unwrap();
    assert_eq!(decoded.len(), 5);
    for (i, frame) in decoded.iter().enumerate() {
        assert_eq!(frame.index, i);
        assert_eq!((frame.width, frame.height), (4, 3));
        assert_eq!(frame.data.len(), 12);
        assert_eq!(frame.data[7], (i * 1000 + 7) as u16);
    }
}

#[test]
fn test_sequence_is_restartable() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ser(dir.path(), "cap.ser", &SerLayout::mono16(2, 2), &frames(3, 4));
    let reader = SerReader::open(&path, None).unwrap();

    let first: Vec<_> = reader.frames().unwrap().map(|f| f.unwrap().data).collect();
    let second: Vec<_> = reader.frames().unwrap().map(|f| f.unwrap().data).collect();
    assert_eq!(first, second);
}

#[test]
fn test_frame_limit_truncates() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ser(dir.path(), "cap.ser", &SerLayout::mono16(2, 2), &frames(6, 4));
    let reader = SerReader::open(&path, Some(2)).unwrap();

    assert_eq!(reader.frame_count(), 2);
    assert_eq!(reader.frames().unwrap().count(), 2);
}

#[test]
fn test_overclaimed_frame_count_is_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let layout = SerLayout {
        declared_frames: Some(10),
        ..SerLayout::mono16(4, 4)
    };
    let path = write_ser(dir.path(), "cap.ser", &layout, &frames(3, 16));

    let result = SerReader::open(&path, None);
    assert!(matches!(result, Err(FlatFieldError::FormatError(_))));
}

#[test]
fn test_oversized_frame_dimensions_are_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let layout = SerLayout {
        width: u32::MAX,
        height: u32::MAX,
        color_id: 100,
        declared_frames: Some(1),
        ..SerLayout::mono16(1, 1)
    };
    let path = write_ser(dir.path(), "huge.ser", &layout, &[]);

    match SerReader::open(&path, None) {
        Err(FlatFieldError::FormatError(msg)) => assert!(msg.contains("frame size overflows"), "{msg}"),
        Err(other) => panic!("expected format error, got {other:?}"),
        Ok(_) => panic!("oversized header accepted"),
    }
}

#[test]
fn test_big_endian_payload() {
    let dir = tempfile::tempdir().unwrap();
    let layout = SerLayout {
        byte_order: 0,
        ..SerLayout::mono16(2, 1)
    };
    let path = write_ser(dir.path(), "cap.ser", &layout, &[vec![0x0102, 0xA0B0]]);
    let reader = SerReader::open(&path, None).unwrap();

    assert_eq!(reader.header().byte_order, ByteOrder::BigEndian);
    let frame = reader.frames().unwrap().next().unwrap().unwrap();
    assert_eq!(frame.data, vec![0x0102, 0xA0B0]);
}

#[test]
fn test_eight_bit_samples() {
    let dir = tempfile::tempdir().unwrap();
    let layout = SerLayout {
        bit_depth: 8,
        ..SerLayout::mono16(3, 1)
    };
    let path = write_ser(dir.path(), "cap.ser", &layout, &[vec![1, 128, 255]]);
    let reader = SerReader::open(&path, None).unwrap();

    assert_eq!(reader.header().max_sample(), 255);
    let frame = reader.frames().unwrap().next().unwrap().unwrap();
    assert_eq!(frame.data, vec![1, 128, 255]);
}

#[test]
fn test_rgb_planes_are_averaged() {
    let dir = tempfile::tempdir().unwrap();
    let layout = SerLayout {
        color_id: 100,
        ..SerLayout::mono16(2, 1)
    };
    let path = write_ser(dir.path(), "cap.ser", &layout, &[vec![10, 20, 30, 0, 0, 3]]);
    let reader = SerReader::open(&path, None).unwrap();

    assert_eq!(reader.header().color_id, ColorId::Rgb);
    let frame = reader.frames().unwrap().next().unwrap().unwrap();
    assert_eq!(frame.data, vec![20, 1]);
}

#[test]
fn test_rejects_bad_id_and_depth() {
    let dir = tempfile::tempdir().unwrap();

    let path = dir.path().join("junk.ser");
    std::fs::write(&path, vec![0u8; 400]).unwrap();
    assert!(matches!(SerReader::open(&path, None), Err(FlatFieldError::FormatError(_))));

    let layout = SerLayout {
        bit_depth: 24,
        ..SerLayout::mono16(2, 2)
    };
    let path = write_ser(dir.path(), "deep.ser", &layout, &frames(1, 4));
    assert!(matches!(SerReader::open(&path, None), Err(FlatFieldError::FormatError(_))));

    let layout = SerLayout {
        color_id: 42,
        ..SerLayout::mono16(2, 2)
    };
    let path = write_ser(dir.path(), "color.ser", &layout, &frames(1, 4));
    assert!(matches!(SerReader::open(&path, None), Err(FlatFieldError::FormatError(_))));
}

#[test]
fn test_missing_file_is_input_error() {
    let result = SerReader::open("/nonexistent/capture.ser", None);
    assert!(matches!(result, Err(FlatFieldError::InputReadError(_))));
}
