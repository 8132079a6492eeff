//! Shared helpers for integration tests.
#![allow(dead_code)]

pub mod socket_guard;

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

/// A lighting document with 2 devices, 3 colours and one effect.
pub const PROFILE_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<LightingEffects>
  <Name>MyProfile</Name>
  <Devices>
    <Device><Name>BlackWidow</Name></Device>
    <Device><Name>Mamba</Name></Device>
  </Devices>
  <EffectLayers>
    <EffectLayer>
      <Effect>spectrum</Effect>
      <Colors>
        <RzColor><Red>255</Red><Green>0</Green><Blue>0</Blue></RzColor>
        <RzColor><Red>0</Red><Green>255</Green><Blue>0</Blue></RzColor>
        <RzColor><Red>0</Red><Green>0</Green><Blue>255</Blue></RzColor>
      </Colors>
    </EffectLayer>
    <EffectLayer><Effect>none</Effect></EffectLayer>
  </EffectLayers>
</LightingEffects>"#;

/// Builds an in-memory zip from `(name, body)` pairs.
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
