use component_engine::{InstanceFlags, Runtime};

/// One mounted instance as seen by the inspector.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub name: String,
    pub depth: usize,
    pub renders: u64,
    pub failures: u64,
    pub hook_slots: usize,
    pub dirty: bool,
    pub failed: bool,
    pub last_render_ms: Option<f32>,
}

pub struct Inspector {
    pub enabled: bool,
    snapshot_count: u64,
    last_flush_count: u64,
    flushes_since_last: u64,
    rows: Vec<Row>,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self {
            enabled: true,
            snapshot_count: 0,
            last_flush_count: 0,
            flushes_since_last: 0,
            rows: Vec::new(),
        }
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
        log::info!("inspector {}", if self.enabled { "enabled" } else { "disabled" });
    }

    /// Captures the runtime's instances. A disabled inspector keeps its
    /// previous rows.
    pub fn snapshot(&mut self, rt: &Runtime) -> &[Row] {
        if !self.enabled {
            return &self.rows;
        }
        self.snapshot_count += 1;
        let flushes = rt.flush_count();
        self.flushes_since_last = flushes.saturating_sub(self.last_flush_count);
        self.last_flush_count = flushes;

        self.rows = rt
            .instances()
            .into_iter()
            .map(|info| Row {
                name: info.name,
                depth: info.depth,
                renders: info.stats.renders,
                failures: info.stats.failures,
                hook_slots: info.hook_slots,
                dirty: info.dirty,
                failed: info.flags.contains(InstanceFlags::FAILED),
                last_render_ms: info.stats.last_duration.map(|d| d.as_secs_f32() * 1000.0),
            })
            .collect();
        &self.rows
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn snapshot_count(&self) -> u64 {
        self.snapshot_count
    }

    /// Flushes between the last two snapshots.
    pub fn flushes_since_last(&self) -> u64 {
        self.flushes_since_last
    }

    /// Single-line summary of the last snapshot.
    pub fn hud_line(&self) -> String {
        let renders: u64 = self.rows.iter().map(|r| r.renders).sum();
        let dirty = self.rows.iter().filter(|r| r.dirty).count();
        let mut lines = vec![
            format!("snapshot: {}", self.snapshot_count),
            format!("instances: {}", self.rows.len()),
            format!("renders: {renders}"),
            format!("dirty: {dirty}"),
            format!("flushes: +{}", self.flushes_since_last),
        ];
        let failed = self.rows.iter().filter(|r| r.failed).count();
        if failed > 0 {
            lines.push(format!("failed: {failed}"));
        }
        lines.join("  |  ")
    }

    /// Tree-shaped table of the last snapshot, one instance per line.
    pub fn table(&self) -> String {
        let mut out = String::new();
        for r in &self.rows {
            out.push_str(&"  ".repeat(r.depth));
            out.push_str(&format!(
                "{}  renders={} hooks={}",
                r.name, r.renders, r.hook_slots
            ));
            if let Some(ms) = r.last_render_ms {
                out.push_str(&format!(" last={ms:.2}ms"));
            }
            if r.dirty {
                out.push_str(" [dirty]");
            }
            if r.failed {
                out.push_str(" [failed]");
            }
            out.push('\n');
        }
        out
    }
}
