//! Property tests for the normalizer's quantified invariants.

use proptest::prelude::*;

use codejudge_tac::normalize::filter;
use codejudge_tac::{normalize, BinOp, Instruction, Operand};

fn temp(i: u32) -> String {
    format!("%v{}", i)
}

/// One plausible IR instruction line over a small temporary pool.
fn line_strategy() -> impl Strategy<Value = String> {
    let value = prop_oneof![
        (0..6u32).prop_map(temp),
        (0..100u32).prop_map(|c| c.to_string()),
    ];
    prop_oneof![
        (0..6u32).prop_map(|d| format!("{} = alloca i32, align 4", temp(d))),
        (value.clone(), 0..6u32)
            .prop_map(|(v, a)| format!("store i32 {}, ptr {}, align 4", v, temp(a))),
        (0..6u32, 0..6u32)
            .prop_map(|(d, a)| format!("{} = load i32, ptr {}, align 4", temp(d), temp(a))),
        (
            0..6u32,
            prop_oneof![Just("add"), Just("sub"), Just("mul"), Just("sdiv")],
            value.clone(),
            value.clone()
        )
            .prop_map(|(d, op, x, y)| format!("{} = {} nsw i32 {}, {}", temp(d), op, x, y)),
        (0..6u32, 0..3u32, value.clone())
            .prop_map(|(d, f, x)| format!("{} = call i32 @f{}(i32 {})", temp(d), f, x)),
        value.prop_map(|v| format!("ret i32 {}", v)),
    ]
}

/// Applies a bijective renaming of the `%vN` pool into the disjoint `%wN`
/// namespace, so plain string replacement is exact.
fn apply_renaming(ir: &str, perm: &[usize]) -> String {
    let mut out = ir.to_string();
    for (i, target) in perm.iter().enumerate() {
        out = out.replace(&format!("%v{}", i), &format!("%w{}", target));
    }
    out
}

fn operand_strategy() -> impl Strategy<Value = Operand> {
    prop_oneof![
        (0..8u32).prop_map(|i| Operand::new(format!("t{}", i))),
        (0..100i32).prop_map(|c| Operand::new(c.to_string())),
        "[a-z]{1,5}".prop_map(|s| Operand::new(format!("@{}", s))),
    ]
}

fn instruction_strategy() -> impl Strategy<Value = Instruction> {
    let bin_op = prop_oneof![
        Just(BinOp::Add),
        Just(BinOp::Sub),
        Just(BinOp::Mul),
        Just(BinOp::Div)
    ];
    prop_oneof![
        operand_strategy().prop_map(|dest| Instruction::Alloca { dest }),
        (operand_strategy(), operand_strategy())
            .prop_map(|(value, addr)| Instruction::Store { value, addr }),
        (operand_strategy(), operand_strategy())
            .prop_map(|(dest, addr)| Instruction::Load { dest, addr }),
        (bin_op, operand_strategy(), operand_strategy(), operand_strategy())
            .prop_map(|(op, dest, lhs, rhs)| Instruction::Binary { op, dest, lhs, rhs }),
        (
            proptest::option::of(operand_strategy()),
            "[a-z]{1,5}".prop_map(|s| Operand::new(format!("@{}", s)))
        )
            .prop_map(|(dest, func)| Instruction::Call { dest, func }),
        proptest::option::of(operand_strategy())
            .prop_map(|value| Instruction::Return { value }),
    ]
}

proptest! {
    #[test]
    fn normalize_never_panics_and_is_deterministic(
        ir in "[a-zA-Z0-9%@=,.;:!{}()* \\n\\t-]{0,300}"
    ) {
        prop_assert_eq!(normalize(&ir), normalize(&ir));
    }

    #[test]
    fn normalization_is_alpha_invariant(
        lines in proptest::collection::vec(line_strategy(), 0..12),
        perm in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle(),
    ) {
        let ir = lines.join("\n");
        let renamed = apply_renaming(&ir, &perm);
        prop_assert_eq!(normalize(&ir), normalize(&renamed));
    }

    #[test]
    fn commutative_operand_order_is_canonical(
        op in prop_oneof![Just("add"), Just("mul")],
        x in prop_oneof![Just("%p".to_string()), Just("%z".to_string()), (0..50u32).prop_map(|c| c.to_string())],
        y in prop_oneof![Just("%q".to_string()), Just("%y".to_string()), (0..50u32).prop_map(|c| c.to_string())],
    ) {
        let header = "%p = load i32, ptr %a\n%q = load i32, ptr %b\n";
        let forward = format!("{}%r = {} i32 {}, {}", header, op, x, y);
        let reversed = format!("{}%r = {} i32 {}, {}", header, op, y, x);
        prop_assert_eq!(normalize(&forward), normalize(&reversed));
    }

    #[test]
    fn filter_is_idempotent(
        instructions in proptest::collection::vec(instruction_strategy(), 0..20)
    ) {
        let once = filter(instructions);
        let twice = filter(once.clone());
        prop_assert_eq!(once, twice);
    }
}
