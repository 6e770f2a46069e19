use chokepoint::ChokePoint;

#[test]
fn test_second_acquire_is_refused() {
    let choke = ChokePoint::new();

    let pass = choke.try_acquire("a1".to_string());
    assert!(pass.is_some());
    assert!(choke.try_acquire("a1".to_string()).is_none());
    assert!(choke.is_in_flight(&"a1".to_string()));
}

#[test]
fn test_drop_releases_key() {
    let choke = ChokePoint::new();

    {
        let _pass = choke.try_acquire(7u32).unwrap();
        assert_eq!(choke.len(), 1);
    }

    assert!(choke.is_empty());
    assert!(choke.try_acquire(7u32).is_some());
}

#[test]
fn test_keys_are_independent() {
    let choke = ChokePoint::new();

    let first = choke.try_acquire(("items", "a1")).unwrap();
    let second = choke.try_acquire(("favorites", "a1")).unwrap();

    assert_eq!(first.key(), &("items", "a1"));
    assert_eq!(second.key(), &("favorites", "a1"));
    assert_eq!(choke.len(), 2);

    drop(first);
    assert!(!choke.is_in_flight(&("items", "a1")));
    assert!(choke.is_in_flight(&("favorites", "a1")));
}
