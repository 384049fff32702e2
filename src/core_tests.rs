//! Unit tests for `Message` bounds and the J1708 checksum.
use super::*;

#[test]
/// Length 2 and 21 are accepted, 1 and 22 are refused.
fn test_length_bounds() {
    assert!(Message::new(&[0x80, 0x01]).is_ok());
    assert!(Message::new(&[0xAA; 21]).is_ok());

    assert_eq!(
        Message::new(&[0x80]),
        Err(MessageError::InvalidLength { len: 1 })
    );
    assert_eq!(
        Message::new(&[0xAA; 22]),
        Err(MessageError::InvalidLength { len: 22 })
    );
    assert!(Message::new(&[]).is_err());
}

#[test]
/// Accessors expose the MID and only the populated bytes.
fn test_accessors() {
    let msg = Message::new(&[0x01, 0xAA, 0xBB]).unwrap();
    assert_eq!(msg.mid(), 0x01);
    assert_eq!(msg.len(), 3);
    assert!(!msg.is_empty());
    assert_eq!(msg.as_slice(), &[0x01, 0xAA, 0xBB]);

    let converted = Message::try_from(&[0x01u8, 0xAA, 0xBB][..]).unwrap();
    assert_eq!(converted, msg);
}

#[test]
/// Checksum is the two's complement of the byte sum.
fn test_checksum_of() {
    // 0x80 + 0x54 + 0x20 = 0xF4 -> 0x100 - 0xF4 = 0x0C
    assert_eq!(checksum_of(&[0x80, 0x54, 0x20]), 0x0C);
    // A sum that is already zero stays zero.
    assert_eq!(checksum_of(&[0x80, 0x80]), 0x00);
    assert_eq!(checksum_of(&[]), 0x00);
}

#[test]
/// `with_checksum` appends a checksum that validates.
fn test_with_checksum() {
    let msg = Message::with_checksum(&[0x80, 0x54, 0x20]).unwrap();
    assert_eq!(msg.as_slice(), &[0x80, 0x54, 0x20, 0x0C]);
    assert!(msg.has_valid_checksum());

    let corrupted = Message::new(&[0x80, 0x54, 0x21, 0x0C]).unwrap();
    assert!(!corrupted.has_valid_checksum());

    // 20 payload bytes + checksum is the longest legal message.
    assert!(Message::with_checksum(&[0x11; 20]).is_ok());
    assert!(Message::with_checksum(&[0x11; 21]).is_err());
    assert!(Message::with_checksum(&[]).is_err());
}
