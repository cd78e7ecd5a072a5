#![no_main]

use libfuzzer_sys::fuzz_target;
use swf_bitstream::fuzz::codec::*;

fuzz_target!(|data: FuzzCase| harness(data));
