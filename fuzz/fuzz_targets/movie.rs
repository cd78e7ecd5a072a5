#![no_main]

use libfuzzer_sys::fuzz_target;
use swf_bitstream::fuzz::movie::*;

fuzz_target!(|data: &[u8]| harness(data));
