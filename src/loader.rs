//! ELF64 image loading.
//!
//! Only little-endian AArch64 executables are accepted. Every `PT_LOAD`
//! header with a non-zero memory size becomes one [`Segment`]; the heap
//! starts at the first of the linker symbols in [`HEAP_SYMBOLS`] that the
//! image defines.

use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use goblin::elf::Elf;
use goblin::elf::header::EM_AARCH64;
use goblin::elf::program_header::{PF_W, PT_LOAD};

use emu::cpu::interpreter::Segment;

/// Linker symbols marking the end of the image, in order of preference.
pub const HEAP_SYMBOLS: [&str; 3] = ["end", "__end__", "_end"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub entry: u64,
    pub segments: Vec<Segment>,

    /// Name and value of the heap start symbol.
    pub heap: Option<(&'static str, u64)>,
}

impl Image {
    pub fn heap_start(&self) -> Option<u64> {
        self.heap.map(|(_, address)| address)
    }
}

pub fn load_file(path: &Path) -> anyhow::Result<Image> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    parse(&bytes).with_context(|| format!("loading {}", path.display()))
}

pub fn parse(bytes: &[u8]) -> anyhow::Result<Image> {
    let elf = Elf::parse(bytes).context("malformed ELF")?;

    if !elf.is_64 {
        bail!("not a 64-bit ELF image");
    }
    if !elf.little_endian {
        bail!("not a little-endian ELF image");
    }
    if elf.header.e_machine != EM_AARCH64 {
        bail!("not an AArch64 image (machine {})", elf.header.e_machine);
    }

    let mut segments = Vec::new();
    for header in &elf.program_headers {
        if header.p_type != PT_LOAD || header.p_memsz == 0 {
            continue;
        }

        let file_range = header.file_range();
        let contents = bytes.get(file_range.clone()).with_context(|| {
            format!(
                "segment at {:#018X} points past the end of the file ({file_range:?})",
                header.p_vaddr
            )
        })?;

        tracing::debug!(
            "segment {:#018X}: {} file bytes, {} memory bytes",
            header.p_vaddr,
            header.p_filesz,
            header.p_memsz
        );
        segments.push(Segment {
            base: header.p_vaddr,
            bytes: contents.to_vec(),
            mem_len: header.p_memsz,
            writable: header.p_flags & PF_W != 0,
            debug: false,
        });
    }

    let heap = HEAP_SYMBOLS.into_iter().find_map(|name| {
        elf.syms
            .iter()
            .find(|sym| elf.strtab.get_at(sym.st_name) == Some(name))
            .map(|sym| (name, sym.st_value))
    });

    Ok(Image {
        entry: elf.entry,
        segments,
        heap,
    })
}
