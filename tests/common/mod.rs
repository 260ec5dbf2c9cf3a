// tests/common/mod.rs
// In-process engine used by the integration tests

#![allow(dead_code)]

use exasm_debugger::buffers::{BufferManager, MemoryStore};
use exasm_debugger::debugger::{Controller, ControllerConfig, Effect};
use exasm_debugger::engine::{
    Address, Engine, EngineError, EngineInstance, RegisterIndex, Word, ADDRESS_SPACE,
    REGISTER_COUNT,
};
use exasm_debugger::App;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::rc::Rc;

/// Counts loads, runs and step history across every instance an engine made.
#[derive(Debug, Default)]
pub struct Counters {
    pub loads: usize,
    pub destroys: usize,
    pub live: usize,
    /// Address of every instruction actually executed, in order.
    pub executed: Vec<Address>,
    /// Make the next step report a transport failure.
    pub fail_next_step: bool,
}

pub type SharedCounters = Rc<RefCell<Counters>>;

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Nop,
    Li(usize, Word),
    Addi(usize, Word),
    Sb(usize, Address),
    J(Address),
}

#[derive(Debug, Clone)]
struct Machine {
    pc: Address,
    regs: [Word; REGISTER_COUNT],
    mem: Vec<u8>,
    clock: u64,
}

pub struct FakeEngine {
    counters: SharedCounters,
}

impl FakeEngine {
    pub fn new() -> (Self, SharedCounters) {
        let counters = SharedCounters::default();
        (
            Self {
                counters: counters.clone(),
            },
            counters,
        )
    }
}

pub struct FakeInstance {
    program: Vec<Op>,
    texts: Vec<String>,
    machine: Machine,
    history: Vec<Machine>,
    breakpoints: BTreeSet<Address>,
    trapped: Option<Address>,
    hit: Option<Address>,
    counters: SharedCounters,
}

fn number(text: &str) -> Option<u64> {
    match text.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

fn register(text: &str) -> Option<usize> {
    let index: usize = text.strip_prefix('r')?.parse().ok()?;
    (index < REGISTER_COUNT).then_some(index)
}

fn parse_program(text: &str) -> Result<(Vec<Op>, Vec<String>), String> {
    let mut ops = Vec::new();
    let mut texts = Vec::new();
    for (n, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let words: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|w| !w.is_empty())
            .collect();
        let op = match words.as_slice() {
            ["nop"] => Some(Op::Nop),
            ["li", rd, imm] => register(rd)
                .zip(number(imm))
                .map(|(rd, imm)| Op::Li(rd, imm as Word)),
            ["addi", rd, imm] => register(rd)
                .zip(number(imm))
                .map(|(rd, imm)| Op::Addi(rd, imm as Word)),
            ["sb", rs, addr] => register(rs)
                .zip(number(addr))
                .map(|(rs, addr)| Op::Sb(rs, addr as Address)),
            ["j", addr] => number(addr).map(|addr| Op::J(addr as Address)),
            _ => None,
        };
        let op = op.ok_or_else(|| format!("line {}: cannot assemble `{}`", n + 1, line))?;
        ops.push(op);
        texts.push(words.join(" "));
    }
    Ok((ops, texts))
}

fn parse_memory_image(text: &str, mem: &mut [u8]) -> Result<(), String> {
    for (n, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let bad = || format!("memory line {}: `{}`", n + 1, line);
        let mut words = line.split_whitespace();
        let addr = words
            .next()
            .and_then(|w| w.strip_prefix('@'))
            .and_then(|w| usize::from_str_radix(w, 16).ok())
            .ok_or_else(bad)?;
        for (offset, word) in words.enumerate() {
            let byte = u8::from_str_radix(word, 2).map_err(|_| bad())?;
            *mem.get_mut(addr + offset).ok_or_else(bad)? = byte;
        }
    }
    Ok(())
}

impl Engine for FakeEngine {
    type Instance = FakeInstance;

    fn load(&mut self, program: &str, memory_image: &str) -> Result<FakeInstance, EngineError> {
        let (program, texts) = parse_program(program).map_err(EngineError::Rejected)?;
        let mut mem = vec![0u8; ADDRESS_SPACE as usize];
        parse_memory_image(memory_image, &mut mem).map_err(EngineError::Rejected)?;

        let mut counters = self.counters.borrow_mut();
        counters.loads += 1;
        counters.live += 1;
        Ok(FakeInstance {
            program,
            texts,
            machine: Machine {
                pc: 0,
                regs: [0; REGISTER_COUNT],
                mem,
                clock: 0,
            },
            history: Vec::new(),
            breakpoints: BTreeSet::new(),
            trapped: None,
            hit: None,
            counters: self.counters.clone(),
        })
    }
}

impl EngineInstance for FakeInstance {
    fn step_forward(&mut self) -> Result<Address, EngineError> {
        if std::mem::take(&mut self.counters.borrow_mut().fail_next_step) {
            return Err(EngineError::Closed);
        }
        let pc = self.machine.pc;
        if self.breakpoints.contains(&pc) && self.trapped != Some(pc) {
            self.trapped = Some(pc);
            self.hit = Some(pc);
            return Ok(pc);
        }
        self.trapped = None;

        let op = self
            .program
            .get(pc as usize / 2)
            .cloned()
            .unwrap_or(Op::Nop);
        self.history.push(self.machine.clone());
        self.counters.borrow_mut().executed.push(pc);

        let m = &mut self.machine;
        m.pc = pc.wrapping_add(2);
        match op {
            Op::Nop => {}
            Op::Li(rd, imm) => m.regs[rd] = imm,
            Op::Addi(rd, imm) => m.regs[rd] = m.regs[rd].wrapping_add(imm),
            Op::Sb(rs, addr) => m.mem[addr as usize] = m.regs[rs] as u8,
            Op::J(addr) => m.pc = addr,
        }
        m.clock += 1;
        Ok(m.pc)
    }

    fn step_backward(&mut self) -> Result<Option<Address>, EngineError> {
        self.trapped = None;
        match self.history.pop() {
            Some(previous) => {
                self.machine = previous;
                Ok(Some(self.machine.pc))
            }
            None => Ok(None),
        }
    }

    fn hit_breakpoint(&mut self) -> Result<Option<Address>, EngineError> {
        Ok(self.hit.take())
    }

    fn set_breakpoint(&mut self, addr: Address) -> Result<(), EngineError> {
        self.breakpoints.insert(addr);
        Ok(())
    }

    fn clear_breakpoint(&mut self, addr: Address) -> Result<(), EngineError> {
        self.breakpoints.remove(&addr);
        Ok(())
    }

    fn read_register(&mut self, index: RegisterIndex) -> Result<Word, EngineError> {
        Ok(self.machine.regs[index.get()])
    }

    fn write_register(&mut self, index: RegisterIndex, value: Word) -> Result<(), EngineError> {
        self.machine.regs[index.get()] = value;
        Ok(())
    }

    fn read_memory(&mut self, start: u32, end: u32) -> Result<Vec<u8>, EngineError> {
        Ok(self.machine.mem[start as usize..end as usize].to_vec())
    }

    fn write_memory(&mut self, dest: u32, bytes: &[u8]) -> Result<(), EngineError> {
        let dest = dest as usize;
        self.machine.mem[dest..dest + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn dump_disassembly(&mut self) -> Result<String, EngineError> {
        Ok(self.texts.join("\n"))
    }

    fn serialize_memory(&mut self) -> Result<String, EngineError> {
        let lines: Vec<String> = self
            .machine
            .mem
            .chunks(2)
            .enumerate()
            .filter(|(_, pair)| pair.iter().any(|&b| b != 0))
            .map(|(i, pair)| format!("@{:02x} {:08b} {:08b}", i * 2, pair[0], pair[1]))
            .collect();
        Ok(lines.join("\n"))
    }

    fn clock_count(&mut self) -> Result<u64, EngineError> {
        Ok(self.machine.clock)
    }

    fn destroy(&mut self) -> Result<(), EngineError> {
        let mut counters = self.counters.borrow_mut();
        counters.destroys += 1;
        counters.live -= 1;
        Ok(())
    }
}

/// Counts up in r1, r2 and stores r1 at 0x30, then loops from 2 forever.
pub const COUNTER: &str = "\
li r1, 5      # 0
addi r1, 1    # 2
addi r2, 3    # 4
sb r1, 0x30   # 6
addi r1, 1    # 8
j 2           # 10";

pub const MEMORY: &str = "@30 00000001 00000010\n@3e 11111111 00000000";

pub fn controller(config: &ControllerConfig) -> (Controller<FakeEngine>, SharedCounters) {
    let (engine, counters) = FakeEngine::new();
    (Controller::new(engine, config), counters)
}

pub fn app(program: &str, memory: &str) -> (App<FakeEngine, MemoryStore>, SharedCounters) {
    let (controller, counters) = controller(&ControllerConfig::default());
    let store = MemoryStore::new()
        .with("program", program)
        .with("memoryImage", memory);
    let app = App::new(controller, BufferManager::new(store), scratch_dir("exports"));
    (app, counters)
}

/// A fresh directory under the system temp dir, unique to this process.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "exasm-debugger-{}-{}",
        std::process::id(),
        name
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("Failed to create scratch dir");
    dir
}

/// Register values from the last `registers` effect.
pub fn last_registers(effects: &[Effect]) -> Option<Vec<Word>> {
    effects.iter().rev().find_map(|e| match e {
        Effect::Registers { cells } => Some(cells.iter().map(|c| c.value).collect()),
        _ => None,
    })
}

/// Window bytes from the last `memory` effect.
pub fn last_memory(effects: &[Effect]) -> Option<Vec<u8>> {
    effects.iter().rev().find_map(|e| match e {
        Effect::Memory { cells, .. } => Some(cells.iter().map(|c| c.value).collect()),
        _ => None,
    })
}

pub fn last_status(effects: &[Effect]) -> Option<String> {
    effects.iter().rev().find_map(|e| match e {
        Effect::Status { message } => Some(
            message
                .as_ref()
                .map(|m| m.text.clone())
                .unwrap_or_default(),
        ),
        _ => None,
    })
}
