/// Unit tests for Key identity and naming

use scopewire::{key_of, Key};
use std::any::TypeId;
use std::collections::{BTreeSet, HashMap, HashSet};

trait Plugin: Send + Sync {}

#[test]
fn test_key_display_name_concrete() {
    let key = Key::of::<String>();
    assert_eq!(key.display_name(), "alloc::string::String");
    assert_eq!(key.to_string(), "alloc::string::String");
    assert_eq!(format!("{:?}", key), "Key(alloc::string::String)");
}

#[test]
fn test_key_display_name_trait_object() {
    let key = Key::of::<dyn Plugin>();
    assert!(key.display_name().starts_with("dyn "));
    assert!(key.display_name().ends_with("Plugin"));
}

#[test]
fn test_key_id_matches_type_id() {
    assert_eq!(Key::of::<u32>().id(), TypeId::of::<u32>());
    assert_eq!(Key::of::<dyn Plugin>().id(), TypeId::of::<dyn Plugin>());
}

#[test]
fn test_key_equality_is_by_type() {
    assert_eq!(key_of::<u32>(), Key::of::<u32>());
    assert_ne!(Key::of::<u32>(), Key::of::<u64>());
    // a trait object and a type implementing it are different services
    struct Impl;
    impl Plugin for Impl {}
    assert_ne!(Key::of::<dyn Plugin>(), Key::of::<Impl>());
}

#[test]
fn test_key_in_hash_collections() {
    let mut set = HashSet::new();
    set.insert(Key::of::<u8>());
    set.insert(Key::of::<u8>());
    set.insert(Key::of::<dyn Plugin>());
    assert_eq!(set.len(), 2);

    let mut map = HashMap::new();
    map.insert(Key::of::<String>(), "string");
    assert_eq!(map.get(&key_of::<String>()), Some(&"string"));
}

#[test]
fn test_key_ordering_is_total() {
    let keys: BTreeSet<Key> = [Key::of::<u8>(), Key::of::<u16>(), Key::of::<u8>()]
        .into_iter()
        .collect();
    assert_eq!(keys.len(), 2);
}

#[test]
fn test_key_is_copy() {
    let a = Key::of::<i64>();
    let b = a;
    assert_eq!(a, b);
}
