use std::{
    io::{self, Write},
    sync::atomic::{AtomicUsize, Ordering},
};

use client_core::{DialogSurface, PageHost};

pub struct TerminalSurface;

impl DialogSurface for TerminalSurface {
    fn set_title(&self, title: &str) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "== {title} ==");
    }

    fn set_body(&self, html: &str) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{html}");
    }

    fn hide(&self) {
        tracing::debug!("dialog hidden");
    }
}

#[derive(Default)]
pub struct TerminalPage {
    reloads: AtomicUsize,
}

impl TerminalPage {
    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl PageHost for TerminalPage {
    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "[page reload requested]");
    }
}
