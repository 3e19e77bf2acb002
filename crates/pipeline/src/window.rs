/// # Summary
/// 固定容量的滚动窗口，用于计算尾随窗口统计量。
///
/// # Invariants
/// - 内存空间在初始化时一次性分配，后续不再扩容。
/// - 始终保持最近 `capacity` 个样本；统计量与样本顺序无关。
#[derive(Debug, Clone)]
pub struct RollingWindow {
    // 内部存储容器
    data: Vec<f64>,
    // 最大容量
    capacity: usize,
    // 窗口已满后下一次覆盖的位置
    cursor: usize,
}

impl RollingWindow {
    /// # Summary
    /// 创建一个新的滚动窗口。
    ///
    /// # Arguments
    /// * `capacity`: 窗口长度；为 0 时按 1 处理。
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    /// # Summary
    /// 向窗口推入新样本。
    ///
    /// # Logic
    /// 1. 未满时直接 push。
    /// 2. 已满时覆盖 cursor 处最旧的样本，并递增（取模）cursor。
    pub fn push(&mut self, item: f64) {
        if self.data.len() < self.capacity {
            self.data.push(item);
        } else {
            self.data[self.cursor] = item;
            self.cursor = (self.cursor + 1) % self.capacity;
        }
    }

    /// 样本数是否已达到窗口长度
    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    pub fn mean(&self) -> Option<f64> {
        mean(&self.data)
    }

    pub fn sample_std(&self) -> Option<f64> {
        sample_std(&self.data)
    }
}

/// 样本均值，空切片返回 None
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / count_f64(values.len()))
}

/// # Summary
/// 样本标准差 (n - 1 自由度)。
///
/// # Returns
/// 样本数少于 2 时返回 None。
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    Some((ss / count_f64(values.len() - 1)).sqrt())
}

/// 样本数转浮点。窗口长度远小于 2^52，不存在精度损失。
#[allow(clippy::cast_precision_loss)]
pub(crate) fn count_f64(n: usize) -> f64 {
    n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_partial() {
        let mut w = RollingWindow::new(4);
        w.push(1.0);
        w.push(3.0);
        assert!(!w.is_full());
        assert_eq!(w.mean(), Some(2.0));
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut w = RollingWindow::new(3);
        for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
            w.push(x);
        }
        assert!(w.is_full());
        assert_eq!(w.mean(), Some(4.0));
    }

    #[test]
    fn test_sample_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // 总体标准差为 2，样本标准差为 sqrt(32/7)
        let std = sample_std(&values).unwrap();
        assert!((std - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(sample_std(&[1.0]), None);
        assert_eq!(mean(&[]), None);

        let mut w = RollingWindow::new(8);
        for x in values {
            w.push(x);
        }
        assert_eq!(w.sample_std(), Some(std));
    }

    #[test]
    fn test_zero_capacity_treated_as_one() {
        let mut w = RollingWindow::new(0);
        w.push(1.0);
        w.push(2.0);
        assert!(w.is_full());
        assert_eq!(w.mean(), Some(2.0));
    }
}
