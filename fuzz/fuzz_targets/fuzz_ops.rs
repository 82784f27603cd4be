#![no_main]

use libfuzzer_sys::fuzz_target;

use regionpool::{Arena, TransferMode, HEADER_SIZE};

fuzz_target!(|data: &[u8]| {
    let Ok(mut arena) = Arena::with_diagnostics(4096) else {
        return;
    };
    let Ok(mut other) = Arena::new(4096) else {
        return;
    };

    for op in data.chunks(3) {
        let arg = op.get(1..).map_or(0, |b| {
            usize::from(b.first().copied().unwrap_or(0))
                | usize::from(b.get(1).copied().unwrap_or(0)) << 8
        });
        match op[0] % 6 {
            0 => {
                let _ = arena.fill(arg);
            }
            1 => arena.reset(),
            2 => {
                arena = match arena.resize(arg.max(1) * 16) {
                    Ok(a) => a,
                    Err(e) => e.into_arena(),
                };
            }
            3 => {
                let _ = arena.copy_from(&other, TransferMode::Append);
            }
            4 => {
                let _ = other.copy_from(&arena, TransferMode::Overwrite);
            }
            _ => {
                let _ = other.fill(arg);
            }
        }

        assert!(arena.cursor() >= HEADER_SIZE);
        assert!(arena.cursor() <= arena.capacity());
        assert_eq!(arena.cursor() % 8, 0);
        assert_eq!(arena.measure(), arena.capacity() - arena.cursor());
        assert!(other.cursor() <= other.capacity());
    }
});
