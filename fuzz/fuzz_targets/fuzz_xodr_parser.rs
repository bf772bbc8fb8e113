#![no_main]

use libfuzzer_sys::fuzz_target;
use xodr_map_compiler::{compile_network, parse_xodr, CompilerOptions};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Geparste Dokumente müssen ohne Panic kompilierbar sein
    if let Ok(network) = parse_xodr(text) {
        if network.primitive_count() <= 64 {
            let options = CompilerOptions {
                resolution: 1.0,
                lane_id_seed: Some(1),
                ..Default::default()
            };
            let _ = compile_network(&network, &options);
        }
    }
});
