//! 请求闸门：同一 fingerprint 的一次「逻辑启动」只放行一次
//!
//! 初始化逻辑可能被宿主重复调用（同一会话触发两次 setup），第二次必须是 no-op。
//! 闸门只是并发保护，不持有任何业务数据。

use crate::core::Fingerprint;

#[derive(Debug, Default)]
pub struct RequestGate {
    /// 当前已放行的 fingerprint；None 表示闸门打开
    admitted: Option<Fingerprint>,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 首次调用返回 true 并锁存；同一 fingerprint 未 reset 前再次调用返回 false。
    /// 传入不同 fingerprint 视为新的逻辑启动。
    pub fn try_start(&mut self, fingerprint: Fingerprint) -> bool {
        if self.admitted == Some(fingerprint) {
            return false;
        }
        self.admitted = Some(fingerprint);
        true
    }

    /// fingerprint 变化 / 失效 / 手动重新生成时清空锁存
    pub fn reset(&mut self) {
        self.admitted = None;
    }

    pub fn is_latched(&self) -> bool {
        self.admitted.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(p: u32, d: u32) -> Fingerprint {
        Fingerprint::new(p, d).unwrap()
    }

    #[test]
    fn test_admits_once_per_logical_start() {
        let mut gate = RequestGate::new();
        assert!(gate.try_start(fp(1, 1)));
        assert!(!gate.try_start(fp(1, 1)));
        assert!(!gate.try_start(fp(1, 1)));
        assert!(gate.is_latched());
    }

    #[test]
    fn test_reset_allows_restart() {
        let mut gate = RequestGate::new();
        assert!(gate.try_start(fp(1, 2)));
        gate.reset();
        assert!(!gate.is_latched());
        assert!(gate.try_start(fp(1, 2)));
    }

    #[test]
    fn test_new_fingerprint_is_new_start() {
        let mut gate = RequestGate::new();
        assert!(gate.try_start(fp(1, 1)));
        assert!(gate.try_start(fp(2, 1)));
        assert!(!gate.try_start(fp(2, 1)));
    }
}
