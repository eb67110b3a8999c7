//! Shared fixture: the ABI-faithful WAT stand-in for the libspot engine.

pub const STUB_WAT: &str = include_str!("../stub_engine.wat");

/// Assembles the stub engine image.
pub fn stub_image() -> Vec<u8> {
    wat::parse_str(STUB_WAT).expect("stub wat assembles")
}

/// Same engine, but reporting a drifted struct size.
pub fn mismatched_image(size: u32) -> Vec<u8> {
    let patched = STUB_WAT.replace(
        "(func (export \"spot_size\") (result i32) (i32.const 128))",
        &format!("(func (export \"spot_size\") (result i32) (i32.const {size}))"),
    );
    assert_ne!(patched, STUB_WAT, "spot_size line must be present to patch");
    wat::parse_str(&patched).expect("patched wat assembles")
}

/// Same engine, but every `free` call traps.
pub fn trapping_free_image() -> Vec<u8> {
    let patched = STUB_WAT.replace(
        "(func $free (export \"free\") (param $ptr i32))",
        "(func $free (export \"free\") (param $ptr i32) unreachable)",
    );
    assert_ne!(patched, STUB_WAT, "free body must be present to patch");
    wat::parse_str(&patched).expect("patched wat assembles")
}

/// Same engine, but with an exhausted allocator (malloc always returns 0).
pub fn exhausted_allocator_image() -> Vec<u8> {
    let patched = STUB_WAT.replace(
        "(local.set $ptr (global.get $bump))",
        "(local.set $ptr (i32.const 0))",
    );
    assert_ne!(patched, STUB_WAT, "malloc body must be present to patch");
    wat::parse_str(&patched).expect("patched wat assembles")
}
