// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2023 Takashi Sakamoto

use {
    firewire_device_descriptor::registry::DescriptorMap,
    std::{io::Read, path::Path},
};

fn main() {
    let code = std::env::args()
        .nth(1)
        .ok_or_else(|| "The first argument is required for path to descriptor file".to_string())
        .and_then(|path| {
            let mut input = String::new();
            std::fs::File::open(Path::new(&path))
                .and_then(|mut file| file.read_to_string(&mut input))
                .map_err(|err| format!("{}: {}", path, err))?;
            DescriptorMap::parse(&input).map_err(|err| format!("{}: {}", path, err))
        })
        .map(|map| {
            print!("{}", map);
            0
        })
        .unwrap_or_else(|msg| {
            eprintln!("{}", msg);
            1
        });

    std::process::exit(code)
}
