use prev_compiler::ast::build::Builder;
use prev_compiler::ast::{BinOp, Decl, FunDecl, Program, SemType};
use prev_compiler::backend::liveness;
use prev_compiler::ir::canon;
use prev_compiler::ir::context::Context;
use prev_compiler::{compile_to_code, compile_to_mmix, frames, ir, MachineConfig};
use test_log::test;

// ── Helpers ──────────────────────────────────────────────────────────────

fn program(funs: Vec<FunDecl>) -> Program {
    Program {
        decls: funs.into_iter().map(Decl::Fun).collect(),
    }
}

/// `add(a, b) = a + b` and `main() = add(1, 2)`.
fn add_program() -> Program {
    let mut b = Builder::new();
    let pa = b.param("a", SemType::Int);
    let pb = b.param("b", SemType::Int);
    let (ida, idb) = (pa.id, pb.id);
    let va = b.var(ida);
    let vb = b.var(idb);
    let sum = b.binary(BinOp::Add, va, vb);
    let add = b.fun("add", vec![pa, pb], SemType::Int, sum);

    let one = b.int(1);
    let two = b.int(2);
    let call = b.call(add.id, vec![one, two]);
    let main = b.fun("main", vec![], SemType::Int, call);
    program(vec![add, main])
}

/// `main() = { var i; i = 0; while i < 10 do i = i + 1; i }`.
fn loop_program() -> Program {
    let mut b = Builder::new();
    let i = b.var_decl("i", SemType::Int);
    let id = i.id;

    let dst = b.var(id);
    let zero = b.int(0);
    let init = b.assign(dst, zero);

    let lhs = b.var(id);
    let ten = b.int(10);
    let cond = b.binary(BinOp::Lt, lhs, ten);
    let dst = b.var(id);
    let cur = b.var(id);
    let one = b.int(1);
    let next = b.binary(BinOp::Add, cur, one);
    let step = b.assign(dst, next);
    let lp = b.while_stmt(cond, vec![step]);

    let value = b.var(id);
    let body = b.block(vec![Decl::Var(i)], vec![init, lp], value);
    let main = b.fun("main", vec![], SemType::Int, body);
    program(vec![main])
}

/// `sum(p0..p5) = p0 + (p1 + (p2 + (p3 + (p4 + p5))))`: every left operand
/// stays live until the innermost addition.
fn deep_sum_program() -> Program {
    let mut b = Builder::new();
    let params: Vec<_> = (0..6)
        .map(|i| b.param(&format!("p{i}"), SemType::Int))
        .collect();
    let ids: Vec<_> = params.iter().map(|p| p.id).collect();

    let mut acc = b.var(ids[5]);
    for &id in ids[..5].iter().rev() {
        let v = b.var(id);
        acc = b.binary(BinOp::Add, v, acc);
    }
    let sum = b.fun("sum", params, SemType::Int, acc);

    let args: Vec<_> = (1..=6).map(|n| b.int(n)).collect();
    let call = b.call(sum.id, args);
    let main = b.fun("main", vec![], SemType::Int, call);
    program(vec![sum, main])
}

fn lines_of(code: &prev_compiler::backend::Code) -> Vec<String> {
    code.instrs
        .iter()
        .filter(|i| !i.is_label())
        .map(|i| i.to_string())
        .collect()
}

// ── End to end ───────────────────────────────────────────────────────────

#[test]
fn add_function_allocates_without_spilling() {
    let out = compile_to_code(&add_program(), &MachineConfig::with_registers(8)).unwrap();
    let add = out.codes.iter().find(|c| c.name == "add").unwrap();
    let lines = lines_of(add);

    assert_eq!(lines.iter().filter(|l| l.starts_with("LDO")).count(), 2);
    assert!(lines.iter().any(|l| l.starts_with("ADD")));
    assert_eq!(add.temp_size, 0);
    assert_eq!(add.regs[&add.frame.fp], 253);
    for (t, &r) in &add.regs {
        if *t != add.frame.fp {
            assert!(r < 8, "{t} got ${r}");
        }
    }
}

#[test]
fn call_arguments_are_stored_above_the_static_link() {
    let out = compile_to_code(&add_program(), &MachineConfig::default()).unwrap();
    let main = out.codes.iter().find(|c| c.name == "main").unwrap();
    let lines = lines_of(main);

    let stores: Vec<_> = lines
        .iter()
        .filter(|l| l.starts_with("STO") && l.contains(",sP,"))
        .collect();
    assert_eq!(stores.len(), 3);
    assert!(stores[0].ends_with("sP,0"));
    assert!(stores[1].ends_with("sP,8"));
    assert!(stores[2].ends_with("sP,16"));
    assert!(lines.iter().any(|l| l == "PUSHJ $8,_add"));
    assert!(lines.iter().any(|l| l.starts_with("LDO") && l.ends_with("sP,0")));
}

#[test]
fn calls_are_evaluated_left_to_right() {
    let mut b = Builder::new();
    let g_body = b.int(1);
    let g = b.fun("g", vec![], SemType::Int, g_body);
    let h_body = b.int(2);
    let h = b.fun("h", vec![], SemType::Int, h_body);
    let px = b.param("x", SemType::Int);
    let py = b.param("y", SemType::Int);
    let f_body = b.int(0);
    let f = b.fun("f", vec![px, py], SemType::Int, f_body);

    let cg = b.call(g.id, vec![]);
    let ch = b.call(h.id, vec![]);
    let cf = b.call(f.id, vec![cg, ch]);
    let main = b.fun("main", vec![], SemType::Int, cf);

    let out = compile_to_code(&program(vec![g, h, f, main]), &MachineConfig::default()).unwrap();
    let main = out.codes.iter().find(|c| c.name == "main").unwrap();
    let calls: Vec<_> = lines_of(main)
        .into_iter()
        .filter(|l| l.starts_with("PUSHJ"))
        .collect();
    assert_eq!(calls, ["PUSHJ $8,_g", "PUSHJ $8,_h", "PUSHJ $8,_f"]);
}

#[test]
fn loop_code_is_at_a_liveness_fixpoint() {
    let out = compile_to_code(&loop_program(), &MachineConfig::default()).unwrap();
    let main = &out.codes[0];
    assert!(liveness::is_fixpoint(main).unwrap());

    // The back edge makes something live across the loop header.
    let header = main.instrs.iter().position(|i| i.is_label()).unwrap();
    assert!(main.instrs[header..].iter().any(|i| i.to_string().starts_with("CMP")));
    assert!(main.instrs.iter().any(|i| i.to_string().starts_with("BNZ")));
}

#[test]
fn live_temps_never_share_a_register() {
    for config in [MachineConfig::default(), MachineConfig::with_registers(3)] {
        let out = compile_to_code(&deep_sum_program(), &config).unwrap();
        for code in &out.codes {
            for instr in &code.instrs {
                for a in &instr.live_out {
                    for b in &instr.live_out {
                        if a != b {
                            assert_ne!(code.regs[a], code.regs[b], "{a} and {b} in {}", code.name);
                        }
                    }
                    for d in instr.defs() {
                        if d != a {
                            assert_ne!(code.regs[a], code.regs[d], "{a} and {d} in {}", code.name);
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn few_registers_force_spills() {
    let roomy = compile_to_code(&deep_sum_program(), &MachineConfig::default()).unwrap();
    let tight = compile_to_code(&deep_sum_program(), &MachineConfig::with_registers(3)).unwrap();

    let roomy_sum = roomy.codes.iter().find(|c| c.name == "sum").unwrap();
    let tight_sum = tight.codes.iter().find(|c| c.name == "sum").unwrap();
    assert_eq!(roomy_sum.temp_size, 0);
    assert!(tight_sum.temp_size > 0);
    assert!(tight_sum.instrs.len() > roomy_sum.instrs.len());
    assert!(tight_sum
        .regs
        .iter()
        .all(|(t, &r)| *t == tight_sum.frame.fp || r < 3));
}

// ── Canonical form ───────────────────────────────────────────────────────

#[test]
fn canonical_chunks_are_stable() {
    for prog in [add_program(), loop_program(), deep_sum_program()] {
        let mut ctx = Context::new();
        let frames = frames::evaluate(&prog, &mut ctx).unwrap();
        let imc = ir::ir_generator::generate(&prog, &frames, &mut ctx).unwrap();
        let chunks = canon::chunks(&imc, &mut ctx).unwrap();
        for chunk in &chunks {
            let again = canon::canonicalize(&chunk.stmts, &mut ctx).unwrap();
            assert_eq!(again, chunk.stmts, "{}", chunk.name);
        }
    }
}

// ── Errors ───────────────────────────────────────────────────────────────

#[test]
fn one_register_is_rejected_up_front() {
    let err = compile_to_code(&add_program(), &MachineConfig::with_registers(1)).unwrap_err();
    assert!(matches!(err, prev_compiler::CompileError::Config(_)));
}

#[test]
fn aggregate_parameters_are_rejected() {
    let mut b = Builder::new();
    let pr = b.param("r", SemType::arr(3, SemType::Int));
    let px = b.param("x", SemType::Int);
    let xid = px.id;
    let x = b.var(xid);
    let f = b.fun("f", vec![pr, px], SemType::Int, x);
    let zero = b.int(0);
    let main = b.fun("main", vec![], SemType::Int, zero);

    let err = compile_to_code(&program(vec![f, main]), &MachineConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        prev_compiler::CompileError::Internal {
            phase: prev_compiler::Phase::Frames,
            ..
        }
    ));
}

#[test]
fn program_without_main_cannot_be_emitted() {
    let mut b = Builder::new();
    let body = b.int(0);
    let f = b.fun("f", vec![], SemType::Int, body);
    let err = compile_to_mmix(&program(vec![f]), &MachineConfig::default()).unwrap_err();
    assert!(err.to_string().contains("main"));
}

// ── Assembly text ────────────────────────────────────────────────────────

#[test]
fn mmix_program_has_bootstrap_and_named_registers() {
    let asm = compile_to_mmix(&add_program(), &MachineConfig::default()).unwrap();
    assert!(asm.starts_with("fP\tGREG\t0\nsP\tGREG\t0"));
    assert!(asm.contains("Main\tSETH\tfP,1"));
    assert!(asm.contains("PUSHJ\t$8,_main"));
    assert!(asm.contains("_main\tSET\t$1,fP"));
    assert!(asm.contains("_add\tSET\t$1,fP"));
    assert!(asm.contains("\t\tPOP\t0,0"));
    assert!(!asm.contains("$253"));
    assert!(!asm.contains("$254"));
}

#[test]
fn dollar_signs_in_string_literals_survive_emission() {
    let mut b = Builder::new();
    let ps = b.param("s", SemType::ptr(SemType::Char));
    let put = b.declare_fun("putString", vec![ps], SemType::Void);
    let text = b.string("price $253 and $254");
    let call = b.call(put.id, vec![text]);
    let zero = b.int(0);
    let stmt = b.expr_stmt(call);
    let body = b.block(vec![], vec![stmt], zero);
    let main = b.fun("main", vec![], SemType::Int, body);

    let asm = compile_to_mmix(&program(vec![put, main]), &MachineConfig::default()).unwrap();
    assert!(asm.contains("\tBYTE\t\"price $253 and $254\",0"));
}

#[test]
fn globals_past_the_first_page_are_addressed_by_wydes() {
    let mut b = Builder::new();
    let table = b.var_decl("table", SemType::arr(100, SemType::Int));
    let last = b.var_decl("last", SemType::Int);
    let lid = last.id;
    let value = b.var(lid);
    let main = b.fun("main", vec![], SemType::Int, value);

    let prog = Program {
        decls: vec![Decl::Var(table), Decl::Var(last), Decl::Fun(main)],
    };
    let asm = compile_to_mmix(&prog, &MachineConfig::default()).unwrap();
    assert!(asm.contains("_table\tOCTA\t0\n\t\tLOC\t@+792"));
    assert!(asm.contains(",(_last>>48)&#FFFF"));
    assert!(asm.contains(",(_last>>0)&#FFFF"));
    assert!(!asm.lines().any(|l| l.contains("LDA") && l.contains("_last")));
}

#[test]
fn put_int_divides_unsigned() {
    let mut b = Builder::new();
    let pn = b.param("n", SemType::Int);
    let put = b.declare_fun("putInt", vec![pn], SemType::Void);
    let min = b.int(i64::MIN);
    let call = b.call(put.id, vec![min]);
    let zero = b.int(0);
    let stmt = b.expr_stmt(call);
    let body = b.block(vec![], vec![stmt], zero);
    let main = b.fun("main", vec![], SemType::Int, body);

    let asm = compile_to_mmix(&program(vec![put, main]), &MachineConfig::default()).unwrap();
    assert!(asm.contains("\t\tPUT\trD,0"));
    assert!(asm.contains("\t\tDIVU\t$0,$0,10"));
}

#[test]
fn strings_and_runtime_are_emitted() {
    let mut b = Builder::new();
    let ps = b.param("s", SemType::ptr(SemType::Char));
    let put = b.declare_fun("putString", vec![ps], SemType::Void);
    let hello = b.string("hi\n");
    let call = b.call(put.id, vec![hello]);
    let zero = b.int(0);
    let stmt = b.expr_stmt(call);
    let body = b.block(vec![], vec![stmt], zero);
    let main = b.fun("main", vec![], SemType::Int, body);

    let asm = compile_to_mmix(&program(vec![put, main]), &MachineConfig::default()).unwrap();
    assert!(asm.contains("\tBYTE\t\"hi\",10,0"));
    assert!(asm.contains("_putString\tLDO\t$255,sP,8"));
    assert!(asm.contains("PUSHJ\t$8,_putString"));
    assert!(!asm.contains("_putInt"));
}

#[test]
fn user_definitions_replace_runtime_routines() {
    let mut b = Builder::new();
    let pn = b.param("n", SemType::Int);
    let body = b.void();
    let put = b.fun("putInt", vec![pn], SemType::Void, body);
    let zero = b.int(0);
    let main = b.fun("main", vec![], SemType::Int, zero);

    let asm = compile_to_mmix(&program(vec![put, main]), &MachineConfig::default()).unwrap();
    assert_eq!(asm.matches("_putInt\t").count(), 1);
    assert!(asm.contains("_putInt\tSET\t$1,fP"));
}

#[test]
fn programs_survive_a_json_round_trip() {
    let prog = loop_program();
    let json = serde_json::to_string(&prog).unwrap();
    let back: Program = serde_json::from_str(&json).unwrap();
    let config = MachineConfig::default();
    assert_eq!(
        compile_to_mmix(&prog, &config).unwrap(),
        compile_to_mmix(&back, &config).unwrap()
    );
}
