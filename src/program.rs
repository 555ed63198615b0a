use std::collections::HashMap;
use std::fmt;

use crate::error::ProgramError;

/// The creature instruction set.
///
/// HOP, LEFT, RIGHT and INFECT end a creature's turn. The rest only steer
/// the program counter (and, for IFWALL and IFSAME, the facing) and let the
/// creature keep executing within the same turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    Hop,
    Left,
    Right,
    Infect,
    IfEmpty,
    IfWall,
    IfSame,
    IfEnemy,
    IfRandom,
    Go,
    Label,
}

impl Opcode {
    /// Opcodes that may appear as the first token of an instruction line.
    /// Labels are written `name:` instead.
    pub const MNEMONICS: [Opcode; 10] = [
        Opcode::Hop,
        Opcode::Left,
        Opcode::Right,
        Opcode::Infect,
        Opcode::IfEmpty,
        Opcode::IfWall,
        Opcode::IfSame,
        Opcode::IfEnemy,
        Opcode::IfRandom,
        Opcode::Go,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Hop => "hop",
            Self::Left => "left",
            Self::Right => "right",
            Self::Infect => "infect",
            Self::IfEmpty => "ifempty",
            Self::IfWall => "ifwall",
            Self::IfSame => "ifsame",
            Self::IfEnemy => "ifenemy",
            Self::IfRandom => "ifrandom",
            Self::Go => "go",
            Self::Label => "label",
        }
    }

    /// Exact-match lookup of a source mnemonic.
    pub fn from_mnemonic(token: &str) -> Option<Self> {
        Self::MNEMONICS.into_iter().find(|op| op.name() == token)
    }

    /// True if executing this opcode consumes the creature's turn.
    pub const fn is_terminating(self) -> bool {
        matches!(self, Self::Hop | Self::Left | Self::Right | Self::Infect)
    }

    const fn expected_operands(self) -> &'static str {
        match self {
            Self::Hop | Self::Left | Self::Right | Self::Label => "no operands",
            Self::Infect => "at most one label",
            Self::IfEmpty
            | Self::IfWall
            | Self::IfSame
            | Self::IfEnemy
            | Self::IfRandom
            | Self::Go => "exactly one label",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A label operand, resolved to an address at parse time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    name: String,
    address: usize,
}

impl Target {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> usize {
        self.address
    }
}

/// One program step. Every jump carries an already-resolved [`Target`], so
/// a parsed program can never refer to a missing label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Hop,
    Left,
    Right,
    Infect(Option<Target>),
    IfEmpty(Target),
    IfWall(Target),
    IfSame(Target),
    IfEnemy(Target),
    IfRandom(Target),
    Go(Target),
    Label(String),
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Hop => Opcode::Hop,
            Self::Left => Opcode::Left,
            Self::Right => Opcode::Right,
            Self::Infect(_) => Opcode::Infect,
            Self::IfEmpty(_) => Opcode::IfEmpty,
            Self::IfWall(_) => Opcode::IfWall,
            Self::IfSame(_) => Opcode::IfSame,
            Self::IfEnemy(_) => Opcode::IfEnemy,
            Self::IfRandom(_) => Opcode::IfRandom,
            Self::Go(_) => Opcode::Go,
            Self::Label(_) => Opcode::Label,
        }
    }

    /// The label operand, if this instruction has one.
    pub fn target(&self) -> Option<&Target> {
        match self {
            Self::Infect(target) => target.as_ref(),
            Self::IfEmpty(target)
            | Self::IfWall(target)
            | Self::IfSame(target)
            | Self::IfEnemy(target)
            | Self::IfRandom(target)
            | Self::Go(target) => Some(target),
            Self::Hop | Self::Left | Self::Right | Self::Label(_) => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(name) => write!(f, "{name}:"),
            other => match other.target() {
                Some(target) => write!(f, "{} {}", other.opcode(), target.name),
                None => write!(f, "{}", other.opcode()),
            },
        }
    }
}

/// An immutable instruction sequence with its label table.
///
/// Labels occupy real addresses: `start:` followed by `hop` puts the label
/// at address 0 and the hop at address 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
}

/// A decoded line whose label operand, if any, is not resolved yet.
enum Pending<'a> {
    Ready(Instruction),
    Jump {
        line: usize,
        label: &'a str,
        build: fn(Target) -> Instruction,
    },
}

/// Return the species name: the first line of the source, taken verbatim
/// apart from trailing whitespace.
pub fn species_name(source: &str) -> Result<&str, ProgramError> {
    source
        .lines()
        .next()
        .map(str::trim_end)
        .ok_or(ProgramError::MissingName)
}

/// Parse species source text into a program.
///
/// The first line is the species name and is skipped unconditionally. After
/// it, blank lines and lines starting with `#` are ignored, `name:` defines
/// a label, and anything else is `<opcode>` or `<opcode> <label>`.
pub fn parse(source: &str) -> Result<Program, ProgramError> {
    let mut lines = source.lines().enumerate();
    if lines.next().is_none() {
        return Err(ProgramError::MissingName);
    }

    // Pass 1: decode opcodes and collect label addresses.
    let mut pending: Vec<Pending<'_>> = Vec::new();
    let mut labels: HashMap<String, usize> = HashMap::new();

    for (idx, raw) in lines {
        let line = idx + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let head = tokens[0];
        let address = pending.len();

        if let Some(name) = head.strip_suffix(':') {
            if name.is_empty() {
                return Err(ProgramError::EmptyLabel { line });
            }
            if tokens.len() > 1 {
                return Err(ProgramError::Arity {
                    line,
                    opcode: Opcode::Label.name(),
                    expected: "no operands",
                    found: tokens.len() - 1,
                });
            }
            if let Some(&first) = labels.get(name) {
                return Err(ProgramError::DuplicateLabel {
                    line,
                    name: name.to_string(),
                    first,
                });
            }
            labels.insert(name.to_string(), address);
            pending.push(Pending::Ready(Instruction::Label(name.to_string())));
            continue;
        }

        let opcode = Opcode::from_mnemonic(head).ok_or_else(|| ProgramError::UnknownOpcode {
            line,
            token: head.to_string(),
        })?;
        let next = match (opcode, &tokens[1..]) {
            (Opcode::Hop, &[]) => Pending::Ready(Instruction::Hop),
            (Opcode::Left, &[]) => Pending::Ready(Instruction::Left),
            (Opcode::Right, &[]) => Pending::Ready(Instruction::Right),
            (Opcode::Infect, &[]) => Pending::Ready(Instruction::Infect(None)),
            (Opcode::Infect, &[label]) => Pending::Jump {
                line,
                label,
                build: |t| Instruction::Infect(Some(t)),
            },
            (Opcode::IfEmpty, &[label]) => Pending::Jump {
                line,
                label,
                build: Instruction::IfEmpty,
            },
            (Opcode::IfWall, &[label]) => Pending::Jump {
                line,
                label,
                build: Instruction::IfWall,
            },
            (Opcode::IfSame, &[label]) => Pending::Jump {
                line,
                label,
                build: Instruction::IfSame,
            },
            (Opcode::IfEnemy, &[label]) => Pending::Jump {
                line,
                label,
                build: Instruction::IfEnemy,
            },
            (Opcode::IfRandom, &[label]) => Pending::Jump {
                line,
                label,
                build: Instruction::IfRandom,
            },
            (Opcode::Go, &[label]) => Pending::Jump {
                line,
                label,
                build: Instruction::Go,
            },
            (opcode, operands) => {
                return Err(ProgramError::Arity {
                    line,
                    opcode: opcode.name(),
                    expected: opcode.expected_operands(),
                    found: operands.len(),
                });
            }
        };
        pending.push(next);
    }

    if pending.is_empty() {
        return Err(ProgramError::Empty);
    }

    // Pass 2: resolve every operand against the label table.
    let instructions = pending
        .into_iter()
        .map(|step| match step {
            Pending::Ready(instruction) => Ok(instruction),
            Pending::Jump { line, label, build } => {
                let address = labels.get(label).copied().ok_or_else(|| {
                    ProgramError::UndefinedLabel {
                        line,
                        name: label.to_string(),
                    }
                })?;
                Ok(build(Target {
                    name: label.to_string(),
                    address,
                }))
            }
        })
        .collect::<Result<Vec<_>, ProgramError>>()?;

    Ok(Program {
        instructions,
        labels,
    })
}

impl Program {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The instruction at `address`, if there is one.
    pub fn get(&self, address: usize) -> Option<&Instruction> {
        self.instructions.get(address)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Address of the `LABEL` instruction called `name`.
    pub fn label_address(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }
}

impl fmt::Display for Program {
    /// One `address: instruction` line per step.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (address, instruction) in self.instructions.iter().enumerate() {
            writeln!(f, "{address:>3}: {instruction}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROVER: &str = "\
Rover
# walk until something is in the way
start:
ifenemy attack
ifempty move
ifrandom turn
left
go start
move:
hop
go start
turn:
right
go start
attack:
infect
go start
";

    #[test]
    fn test_parse_counts_and_label_addresses() {
        let program = parse(ROVER).unwrap();
        assert_eq!(program.len(), 15);
        assert_eq!(program.label_address("start"), Some(0));
        assert_eq!(program.label_address("move"), Some(6));
        assert_eq!(program.label_address("turn"), Some(9));
        assert_eq!(program.label_address("attack"), Some(12));
        assert_eq!(program.label_address("nowhere"), None);
        for name in ["start", "move", "turn", "attack"] {
            let addr = program.label_address(name).unwrap();
            assert_eq!(program.get(addr), Some(&Instruction::Label(name.to_string())));
        }
    }

    #[test]
    fn test_operands_are_resolved() {
        let program = parse(ROVER).unwrap();
        let ifenemy = program.get(1).unwrap();
        assert_eq!(ifenemy.opcode(), Opcode::IfEnemy);
        assert_eq!(ifenemy.target().map(Target::address), Some(12));
        assert_eq!(ifenemy.target().map(Target::name), Some("attack"));
        assert_eq!(program.get(13), Some(&Instruction::Infect(None)));
    }

    #[test]
    fn test_species_name_is_first_line() {
        assert_eq!(species_name(ROVER).unwrap(), "Rover");
        // The name line is never treated as a comment.
        let source = "# not a comment\nhop\n";
        assert_eq!(species_name(source).unwrap(), "# not a comment");
        assert_eq!(parse(source).unwrap().len(), 1);
    }

    #[test]
    fn test_blank_name_line_is_consumed() {
        let program = parse("\nleft\nright\n").unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(species_name("\nleft\n").unwrap(), "");
    }

    #[test]
    fn test_skips_blank_and_comment_lines() {
        let source = "Blinker\n\n# comment\n   \nleft\n\n#another\nright\n";
        let program = parse(source).unwrap();
        assert_eq!(program.instructions(), &[Instruction::Left, Instruction::Right]);
    }

    #[test]
    fn test_unknown_opcode() {
        let err = parse("Bad\nhop\njump start\n").unwrap_err();
        assert!(matches!(
            err,
            ProgramError::UnknownOpcode { line: 3, ref token } if token == "jump"
        ));
    }

    #[test]
    fn test_mnemonics_are_case_sensitive() {
        assert!(matches!(
            parse("Loud\nHOP\n"),
            Err(ProgramError::UnknownOpcode { .. })
        ));
    }

    #[test]
    fn test_label_is_not_a_mnemonic() {
        assert!(matches!(
            parse("Odd\nlabel start\n"),
            Err(ProgramError::UnknownOpcode { .. })
        ));
    }

    #[test]
    fn test_undefined_label_is_rejected() {
        let err = parse("Lost\ngo home\n").unwrap_err();
        assert!(matches!(
            err,
            ProgramError::UndefinedLabel { line: 2, ref name } if name == "home"
        ));
        assert!(matches!(
            parse("Lost\ninfect home\n"),
            Err(ProgramError::UndefinedLabel { .. })
        ));
    }

    #[test]
    fn test_duplicate_label_is_rejected() {
        let err = parse("Twice\na:\nhop\na:\n").unwrap_err();
        assert!(matches!(
            err,
            ProgramError::DuplicateLabel { line: 4, first: 0, .. }
        ));
    }

    #[test]
    fn test_arity_checks() {
        assert!(matches!(
            parse("X\nhop there\nthere:\n"),
            Err(ProgramError::Arity { opcode: "hop", .. })
        ));
        assert!(matches!(
            parse("X\ngo\n"),
            Err(ProgramError::Arity { opcode: "go", found: 0, .. })
        ));
        assert!(matches!(
            parse("X\na:\nifwall a a\n"),
            Err(ProgramError::Arity { opcode: "ifwall", found: 2, .. })
        ));
        assert!(matches!(
            parse("X\na: hop\n"),
            Err(ProgramError::Arity { opcode: "label", .. })
        ));
        assert!(matches!(
            parse("X\na:\ninfect a a\n"),
            Err(ProgramError::Arity { opcode: "infect", expected: "at most one label", found: 2, .. })
        ));
        assert!(matches!(
            parse("X\nleft\nright now\n"),
            Err(ProgramError::Arity { line: 3, opcode: "right", expected: "no operands", found: 1 })
        ));
        assert!(matches!(parse("X\n:\n"), Err(ProgramError::EmptyLabel { line: 2 })));
    }

    #[test]
    fn test_infect_label_is_optional() {
        let program = parse("Flu\nspread:\ninfect\ninfect spread\n").unwrap();
        assert_eq!(program.get(1).unwrap().target(), None);
        assert_eq!(program.get(2).unwrap().target().map(Target::address), Some(0));
    }

    #[test]
    fn test_empty_sources() {
        assert!(matches!(parse(""), Err(ProgramError::MissingName)));
        assert!(matches!(species_name(""), Err(ProgramError::MissingName)));
        assert!(matches!(parse("Nobody\n# nothing\n"), Err(ProgramError::Empty)));
    }

    #[test]
    fn test_crlf_line_endings() {
        let program = parse("Win\r\nstart:\r\nhop\r\ngo start\r\n").unwrap();
        assert_eq!(program.len(), 3);
        assert_eq!(species_name("Win\r\nhop\r\n").unwrap(), "Win");
    }

    #[test]
    fn test_listing() {
        let program = parse("L\nloop:\nifrandom loop\ninfect\ngo loop\n").unwrap();
        assert_eq!(
            program.to_string(),
            "  0: loop:\n  1: ifrandom loop\n  2: infect\n  3: go loop\n"
        );
    }

    #[test]
    fn test_terminating_set() {
        let terminating: Vec<Opcode> = Opcode::MNEMONICS
            .into_iter()
            .filter(|op| op.is_terminating())
            .collect();
        assert_eq!(
            terminating,
            vec![Opcode::Hop, Opcode::Left, Opcode::Right, Opcode::Infect]
        );
        assert!(!Opcode::Label.is_terminating());
    }
}
