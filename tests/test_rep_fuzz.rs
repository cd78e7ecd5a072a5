#[cfg(feature = "fuzz")]
use anyhow::Result;

/// Replay the corpus of a fuzz target, if present, and a few thousand
/// seeded random inputs.
macro_rules! impl_fuzz_repr {
    ($func_name:ident, $fuzz_name:ident) => {
        #[cfg(feature = "fuzz")]
        #[test]
        fn $func_name() -> Result<()> {
            use arbitrary::Arbitrary;
            use rand::rngs::StdRng;
            use rand::{Rng, SeedableRng};
            use swf_bitstream::fuzz::$fuzz_name::*;

            let mut inputs = vec![];
            let dir = format!("fuzz/corpus/{}", stringify!($fuzz_name));
            if let Ok(entries) = std::fs::read_dir(&dir) {
                for entry in entries {
                    let entry = entry?;
                    if entry.file_type()?.is_file() {
                        inputs.push(std::fs::read(entry.path())?);
                    }
                }
            }
            let mut r = StdRng::seed_from_u64(0);
            for _ in 0..2000 {
                let len = r.random_range(0..512);
                inputs.push((0..len).map(|_| r.random()).collect());
            }

            for bytes in &inputs {
                let mut unstructured = arbitrary::Unstructured::new(bytes);
                if let Ok(data) = Arbitrary::arbitrary(&mut unstructured) {
                    harness(data);
                }
            }
            Ok(())
        }
    };
}

impl_fuzz_repr!(test_rep_fuzz_codec, codec);
impl_fuzz_repr!(test_rep_fuzz_movie, movie);
