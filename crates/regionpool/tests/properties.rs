//! Property-based tests for alignment, cursor bounds, and failure atomicity.

use proptest::prelude::*;

use regionpool::align::align_allocation;
use regionpool::{Arena, ArenaError, TransferMode, ALIGNMENT, HEADER_SIZE};

#[derive(Debug, Clone)]
enum Op {
    Fill(usize),
    Reset,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        8 => (1usize..2048).prop_map(Op::Fill),
        1 => Just(Op::Reset),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Rounded size is the smallest multiple of the alignment that is >= size.
    #[test]
    fn alignment_is_smallest_multiple(size in 0usize..1_000_000) {
        let rounded = align_allocation(size).unwrap();
        prop_assert_eq!(rounded % ALIGNMENT, 0);
        prop_assert!(rounded >= size);
        prop_assert!(rounded < size + ALIGNMENT);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The cursor stays within [HEADER_SIZE, capacity] and failed fills change nothing.
    #[test]
    fn cursor_stays_in_bounds(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let mut arena = Arena::new(8 * 1024).unwrap();
        for op in ops {
            match op {
                Op::Fill(size) => {
                    let before = arena.cursor();
                    match arena.fill(size) {
                        Ok(alloc) => {
                            prop_assert_eq!(alloc.offset(), before);
                            prop_assert_eq!(arena.cursor(), before + alloc.len());
                        }
                        Err(_) => prop_assert_eq!(arena.cursor(), before),
                    }
                }
                Op::Reset => {
                    arena.reset();
                    prop_assert_eq!(arena.cursor(), HEADER_SIZE);
                }
            }
            prop_assert!(arena.cursor() >= HEADER_SIZE);
            prop_assert!(arena.cursor() <= arena.capacity());
            prop_assert_eq!(arena.measure(), arena.capacity() - arena.cursor());
        }
    }

    /// Handles issued before a reset are always rejected afterwards.
    #[test]
    fn stale_handles_rejected(sizes in prop::collection::vec(1usize..256, 1..20)) {
        let mut arena = Arena::new(8 * 1024).unwrap();
        let handles: Vec<_> = sizes.iter().map(|&s| arena.fill(s).unwrap()).collect();
        arena.reset();
        for handle in &handles {
            let is_stale = matches!(
                arena.bytes(handle),
                Err(ArenaError::StaleAllocation { .. })
            );
            prop_assert!(is_stale);
        }
    }

    /// A transfer that does not fit leaves the destination byte-for-byte unchanged.
    #[test]
    fn failed_transfer_is_atomic(
        dest_fill in 1usize..2000,
        overwrite in any::<bool>(),
    ) {
        let mut source = Arena::new(64 * 1024).unwrap();
        let rest = source.measure();
        source.fill(rest).unwrap();

        let mut dest = Arena::new(2048).unwrap();
        let alloc = dest.fill(dest_fill).unwrap();
        dest.bytes_mut(&alloc).unwrap().fill(0x5A);
        let snapshot = dest.live_bytes().to_vec();
        let cursor = dest.cursor();
        let generation = dest.generation();

        let mode = if overwrite { TransferMode::Overwrite } else { TransferMode::Append };
        prop_assert!(dest.copy_from(&source, mode).is_err());
        prop_assert_eq!(dest.cursor(), cursor);
        prop_assert_eq!(dest.generation(), generation);
        prop_assert_eq!(dest.live_bytes(), snapshot.as_slice());
    }

    /// Growing never loses live data.
    #[test]
    fn grow_preserves_contents(data in prop::collection::vec(any::<u8>(), 1..4000), factor in 2usize..6) {
        let mut arena = Arena::new(4096).unwrap();
        let alloc = arena.fill_copy(&data).unwrap();
        let target = arena.capacity() * factor;
        let arena = arena.resize(target).unwrap();
        prop_assert_eq!(&arena.bytes(&alloc).unwrap()[..data.len()], data.as_slice());
    }
}
