/// Validated limit/offset pair shared by every list-returning repo method.
#[derive(Debug, Clone, Copy)]
pub struct LimitOffset {
    pub limit: i64,
    pub offset: i64,
}

impl LimitOffset {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, 200),
            offset: offset.max(0),
        }
    }
}

impl Default for LimitOffset {
    fn default() -> Self {
        Self { limit: 50, offset: 0 }
    }
}
