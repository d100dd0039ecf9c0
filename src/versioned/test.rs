use super::*;
use crate::{ambient, segment};
use ruc::*;

#[test]
fn uninitialized_reads_are_surfaced() {
    let v = Versioned::<u64>::new();
    assert!(v.get().is_none());
    assert!(v.get_mut().is_none());
    assert_eq!(0, v.version_count());
}

#[test]
fn initial_value_lands_under_the_ambient_revision() {
    let v = Versioned::initialized(5_u64);
    assert_eq!(Some(5), v.get());
    assert_eq!(1, v.version_count());

    let w = Versioned::from(6_u64);
    assert_eq!(Some(6), w.get());
}

#[test]
fn writes_register_once_per_segment() {
    let v = Versioned::new();
    pnk!(v.set(1_u64));
    pnk!(v.set(2));
    pnk!(v.set(3));

    assert_eq!(Some(3), v.get());
    assert_eq!(1, v.version_count());

    // the write set and the version map stay in step
    let cur = ambient::revision().current_version();
    assert!(segment::has_write(cur, v.inner.id()));
}

#[test]
fn get_mut_writes_back_on_drop() {
    let v = Versioned::initialized(String::from("a"));
    if let Some(mut value) = v.get_mut() {
        value.push('b');
    }
    assert_eq!(Some("ab".to_owned()), v.get());
    assert_eq!(1, v.version_count());
}

#[test]
fn clones_share_the_cell() {
    let a = Versioned::initialized(1_i32);
    let b = a.clone();
    pnk!(b.set(2));
    assert_eq!(Some(2), a.get());
}
