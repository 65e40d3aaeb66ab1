//! Operation histograms over the fixed opcode alphabet.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::instr::{Instruction, Opcode};

/// Per-opcode counts for one instruction sequence.
///
/// The key set is always the full alphabet: opcodes that never occur read
/// as zero, and serialization emits every key so consumers never see a
/// partial map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpHistogram {
    counts: [u32; Opcode::ALL.len()],
}

impl OpHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts opcodes in a single pass over the sequence.
    pub fn from_instructions(instructions: &[Instruction]) -> Self {
        let mut histogram = OpHistogram::new();
        for instruction in instructions {
            histogram.increment(instruction.opcode());
        }
        histogram
    }

    pub fn get(&self, op: Opcode) -> u32 {
        self.counts[op as usize]
    }

    pub fn increment(&mut self, op: Opcode) {
        self.counts[op as usize] += 1;
    }

    /// All (opcode, count) pairs in alphabet order, zeros included.
    pub fn iter(&self) -> impl Iterator<Item = (Opcode, u32)> + '_ {
        Opcode::ALL.into_iter().map(|op| (op, self.get(op)))
    }

    /// Combined count of the arithmetic opcodes.
    pub fn arith_total(&self) -> u32 {
        Opcode::ALL
            .into_iter()
            .filter(|op| op.is_arith())
            .map(|op| self.get(op))
            .sum()
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

impl Serialize for OpHistogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Opcode::ALL.len()))?;
        for (op, count) in self.iter() {
            map.serialize_entry(op.name(), &count)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    #[test]
    fn counts_normalized_sequence() {
        let program = normalize(
            "store i32 %0, ptr %2, align 4\n\
             %3 = load i32, ptr %2, align 4\n\
             %4 = add i32 %3, 1\n\
             %5 = add i32 %4, 2\n\
             ret i32 %5",
        );
        let histogram = OpHistogram::from_instructions(&program.instructions);
        assert_eq!(histogram.get(Opcode::Add), 2);
        assert_eq!(histogram.get(Opcode::Store), 1);
        assert_eq!(histogram.get(Opcode::Load), 1);
        assert_eq!(histogram.get(Opcode::Return), 1);
        assert_eq!(histogram.get(Opcode::Mul), 0);
        assert_eq!(histogram.total(), 5);
        assert_eq!(histogram.arith_total(), 2);
    }

    #[test]
    fn counts_prefilter_alloca() {
        // Callers that count before filtering still get an alloca slot.
        let mut histogram = OpHistogram::new();
        histogram.increment(Opcode::Alloca);
        assert_eq!(histogram.get(Opcode::Alloca), 1);
    }

    #[test]
    fn serializes_full_alphabet() {
        let histogram = OpHistogram::new();
        let json = serde_json::to_value(histogram).unwrap();
        let map = json.as_object().unwrap();
        assert_eq!(map.len(), 9);
        for op in Opcode::ALL {
            assert_eq!(map[op.name()], 0, "{}", op);
        }
    }
}
