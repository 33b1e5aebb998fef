#![no_main]
use libfuzzer_sys::fuzz_target;
use zkfs_wire::{decompress_blob, BlobOptions};

fuzz_target!(|data: &[u8]| {
    let _ = decompress_blob(data, &BlobOptions::default());
});
