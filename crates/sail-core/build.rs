// SPDX-License-Identifier: Apache-2.0
//! Precomputes the 1024-entry Q16.16 sine lookup table used by
//! `math::trig`. Generated once at build time so the runtime sin/cos
//! path never calls a platform transcendental.

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const TABLE_LEN: usize = 1024;
const FRAC_BITS: i64 = 16;
const ONE: f64 = (1_i64 << FRAC_BITS) as f64;

fn main() {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR set by cargo");
    let dest = Path::new(&out_dir).join("sin_table.rs");

    let mut body = String::new();
    writeln!(
        body,
        "/// Q16.16 raw values of sin(2*pi*i/{TABLE_LEN}) for i in 0..{TABLE_LEN}."
    )
    .unwrap();
    writeln!(
        body,
        "pub(crate) static SIN_TABLE: [i32; {TABLE_LEN}] = ["
    )
    .unwrap();
    for i in 0..TABLE_LEN {
        let angle = 2.0 * std::f64::consts::PI * (i as f64) / (TABLE_LEN as f64);
        let raw = (angle.sin() * ONE).round() as i64;
        let raw = raw.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        writeln!(body, "    {raw},").unwrap();
    }
    writeln!(body, "];").unwrap();

    fs::write(&dest, body).expect("write sin_table.rs");
    println!("cargo:rerun-if-changed=build.rs");
}
