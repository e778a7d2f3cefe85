#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanSummary {
    pub keyword: Option<String>,
    pub page: u32,
    pub accepted: usize,
    pub max_records: usize,
    pub keywords: usize,
    pub pages: usize,
    pub cards: usize,
    pub opened: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub sync_failures: usize,
    pub stopped: bool,
}
