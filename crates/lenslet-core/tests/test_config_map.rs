use lenslet_core::config::ConfigMap;
use lenslet_core::error::LensletError;

#[test]
fn test_parses_key_value_lines() {
    let text = "\
# comment line
MIDiameter: 23.5
LensletWidth: 2048

MLADirection: 1
";
    let map = ConfigMap::from_reader(text.as_bytes()).unwrap();

    assert_eq!(map.get::<f32>("MIDiameter").unwrap(), 23.5);
    assert_eq!(map.get::<usize>("LensletWidth").unwrap(), 2048);
    assert_eq!(map.get::<u8>("MLADirection").unwrap(), 1);
}

#[test]
fn test_skips_malformed_and_comment_lines() {
    let text = "\
# IsKepler: 1
no delimiter here
: no key
OnlyKey:
Valid: 7
";
    let map = ConfigMap::from_reader(text.as_bytes()).unwrap();

    assert!(!map.contains("IsKepler"));
    assert!(!map.contains("OnlyKey"));
    assert_eq!(map.get::<i32>("Valid").unwrap(), 7);
}

#[test]
fn test_missing_key_is_invalid_param() {
    let map = ConfigMap::from_reader("A: 1\n".as_bytes()).unwrap();
    match map.get::<i32>("B") {
        Err(LensletError::InvalidParam(msg)) => assert!(msg.contains('B')),
        other => panic!("expected InvalidParam, got {other:?}"),
    }
}

#[test]
fn test_unparsable_value_is_invalid_param() {
    let map = ConfigMap::from_reader("A: not-a-number\n".as_bytes()).unwrap();
    assert!(matches!(
        map.get::<f32>("A"),
        Err(LensletError::InvalidParam(_))
    ));
}

#[test]
fn test_get_or_falls_back() {
    let map = ConfigMap::from_reader("A: 3\n".as_bytes()).unwrap();
    assert_eq!(map.get_or::<i32>("A", 9).unwrap(), 3);
    assert_eq!(map.get_or::<i32>("B", 9).unwrap(), 9);
}
