//! Bootstrap and runtime-support routines linked into every program.
//!
//! Routines follow the compiled calling convention: arguments sit at
//! `sP+8`, `sP+16`, ... above the static link at `sP+0`, and a result is
//! returned by storing it at `sP+0`.

/// Heap pointer cell used by `_new`.
pub const HEAP: &str = "_heap";
/// One past the end of the scratch buffer the output routines fill backwards.
pub const NUM_STR: &str = "numStr";

/// Data the routines need, placed at the start of the data segment.
pub fn data() -> Vec<String> {
    vec![
        format!("{HEAP}\tOCTA\t0"),
        "numBuf\tOCTA\t0,0,0".to_string(),
        format!("{NUM_STR}\tBYTE\t0"),
    ]
}

/// `Main`: set up the stack and heap, call `_main`, halt.
pub fn bootstrap(registers: usize) -> Vec<String> {
    vec![
        "Main\tSETH\tfP,1".to_string(),
        "\t\tSETH\tsP,1".to_string(),
        "\t\tSETH\t$0,#2100".to_string(),
        format!("\t\tLDA\t$1,{HEAP}"),
        "\t\tSTO\t$0,$1,0".to_string(),
        format!("\t\tPUSHJ\t${registers},_main"),
        "\t\tTRAP\t0,Halt,0".to_string(),
    ]
}

/// `new(size)`: bump allocator over the heap.
pub fn new_fun() -> Vec<String> {
    vec![
        "_new\tLDO\t$0,sP,8".to_string(),
        format!("\t\tLDA\t$1,{HEAP}"),
        "\t\tLDO\t$2,$1,0".to_string(),
        "\t\tSTO\t$2,sP,0".to_string(),
        "\t\tADD\t$2,$2,$0".to_string(),
        "\t\tSTO\t$2,$1,0".to_string(),
        "\t\tPOP\t0,0".to_string(),
    ]
}

/// `del(ptr)`: memory is never reclaimed.
pub fn del_fun() -> Vec<String> {
    vec!["_del\tPOP\t0,0".to_string()]
}

pub fn put_string_fun() -> Vec<String> {
    vec![
        "_putString\tLDO\t$255,sP,8".to_string(),
        "\t\tTRAP\t0,Fputs,StdOut".to_string(),
        "\t\tPOP\t0,0".to_string(),
    ]
}

/// `putInt(n)`: decimal digits are written backwards ending at `numStr`.
/// The magnitude is divided unsigned, so `-2^63` prints too.
pub fn put_int_fun() -> Vec<String> {
    vec![
        "_putInt\tLDO\t$0,sP,8".to_string(),
        format!("\t\tLDA\t$1,{NUM_STR}"),
        "\t\tSET\t$3,$0".to_string(),
        "\t\tPUT\trD,0".to_string(),
        "\t\tBNN\t$0,putLoop".to_string(),
        "\t\tNEG\t$0,0,$0".to_string(),
        "putLoop\tSUB\t$1,$1,1".to_string(),
        "\t\tDIVU\t$0,$0,10".to_string(),
        "\t\tGET\t$2,rR".to_string(),
        "\t\tADD\t$2,$2,48".to_string(),
        "\t\tSTB\t$2,$1,0".to_string(),
        "\t\tBNZ\t$0,putLoop".to_string(),
        "\t\tBNN\t$3,putOut".to_string(),
        "\t\tSUB\t$1,$1,1".to_string(),
        "\t\tSETL\t$2,45".to_string(),
        "\t\tSTB\t$2,$1,0".to_string(),
        "putOut\tSET\t$255,$1".to_string(),
        "\t\tTRAP\t0,Fputs,StdOut".to_string(),
        "\t\tPOP\t0,0".to_string(),
    ]
}

pub fn put_char_fun() -> Vec<String> {
    vec![
        "_putChar\tLDO\t$0,sP,8".to_string(),
        format!("\t\tLDA\t$1,{NUM_STR}"),
        "\t\tSUB\t$1,$1,1".to_string(),
        "\t\tSTB\t$0,$1,0".to_string(),
        "\t\tSET\t$255,$1".to_string(),
        "\t\tTRAP\t0,Fputs,StdOut".to_string(),
        "\t\tPOP\t0,0".to_string(),
    ]
}

/// Runtime routines keyed by the source-level name they implement.
pub fn routines() -> Vec<(&'static str, Vec<String>)> {
    vec![
        ("new", new_fun()),
        ("del", del_fun()),
        ("putString", put_string_fun()),
        ("putInt", put_int_fun()),
        ("putChar", put_char_fun()),
    ]
}
