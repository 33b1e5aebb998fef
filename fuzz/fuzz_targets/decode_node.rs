#![no_main]
use libfuzzer_sys::fuzz_target;
use zkfs_wire::decode_node;

fuzz_target!(|data: &[u8]| {
    let _ = decode_node(data);
});
