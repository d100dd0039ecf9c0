use super::*;
use crate::{ambient, segment, Versioned};
use ruc::*;

#[test]
fn ambient_is_lazy_and_stable() {
    let a = ambient::revision();
    let b = ambient::revision();
    assert!(Arc::ptr_eq(&a, &b));

    // a standalone revision sits directly on its own root
    assert!(segment::is_ancestor(a.root, a.current_version()));
    assert_ne!(a.root, a.current_version());
}

#[test]
fn fork_moves_the_fork_point() {
    let main = ambient::revision();
    let at = main.current_version();

    let r = pnk!(fork(|| {}));

    // both sides continue on fresh segments sharing the fork point
    assert_ne!(at, main.current_version());
    assert_eq!(Some(at), segment::parent_of(main.current_version()));
    assert_eq!(at, r.ctl.root);
    assert_eq!(Some(at), segment::parent_of(r.ctl.current_version()));

    // two child links plus the child's `root` role
    assert_eq!(Some(3), segment::refcount_of(at));

    pnk!(r.join());
}

#[test]
fn join_releases_the_whole_branch() {
    let r = pnk!(fork(|| {}));
    let branch_cur = r.ctl.current_version();
    let fork_point = r.ctl.root;

    pnk!(r.join());

    assert!(!segment::is_live(branch_cur));
    // the fork point became exclusively owned and was folded away
    assert!(!segment::is_live(fork_point));
}

#[test]
fn merged_values_resolve_from_the_joiner_chain() {
    let v = Versioned::initialized(1_u32);
    let vr = v.clone();
    let r = pnk!(fork(move || pnk!(vr.set(2))));
    pnk!(r.join());

    let main = ambient::revision();
    assert_eq!(Some(2), v.get());
    // after the collapse the value lives in the current segment itself
    assert_eq!(Some(main.root), segment::parent_of(main.current_version()));
}

#[test]
fn is_finished_reports_without_blocking() {
    let (tx, rx) = std::sync::mpsc::channel();
    let r = pnk!(fork(move || {
        pnk!(rx.recv());
    }));
    assert!(!r.is_finished());
    pnk!(tx.send(()));
    pnk!(r.join());
}
