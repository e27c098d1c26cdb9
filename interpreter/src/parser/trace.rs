use log::trace;

const INDENTATION: &str = "\t";

/// Indented BEGIN/END trace of the parse routines. Owned by one parser, so nested or concurrent
/// parsers never share a depth counter.
#[derive(Debug, Default)]
pub struct Tracer {
    enabled: bool,
    depth: usize,
}

impl Tracer {
    pub fn new(enabled: bool) -> Self {
        Tracer { enabled, depth: 0 }
    }

    #[cfg(test)]
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub fn enter(&mut self, name: &str) {
        if !self.enabled {
            return;
        }

        self.depth += 1;
        self.print(&format!("BEGIN {}", name));
    }

    pub fn exit(&mut self, name: &str) {
        if !self.enabled {
            return;
        }

        self.print(&format!("END {}", name));
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn indentation(&self) -> String {
        INDENTATION.repeat(self.depth.saturating_sub(1))
    }

    fn print(&self, msg: &str) {
        trace!("{}{}", self.indentation(), msg);
    }
}
