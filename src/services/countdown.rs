//! 倒计时 - 业务能力层
//!
//! 纯状态机，不持有定时器；由编排层每秒调用一次 `tick`

/// 倒计时状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Running,
    Stopped,
}

/// 单次 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 减一后仍大于零
    Ticked { remaining: u32 },
    /// 本次 tick 把时间减到零，只会出现一次
    Expired,
    /// 已停止或被冻结，未计时
    Idle,
}

/// 倒计时
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: u32,
    state: CountdownState,
}

impl Countdown {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            remaining: duration_secs,
            state: CountdownState::Running,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    /// 前进一秒
    ///
    /// `frozen` 为 true 时不计时（暂停策略由调用方决定）
    pub fn tick(&mut self, frozen: bool) -> TickOutcome {
        if self.state == CountdownState::Stopped || frozen || self.remaining == 0 {
            return TickOutcome::Idle;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Ticked {
                remaining: self.remaining,
            }
        }
    }

    /// 提交后停止，剩余时间保持不变
    pub fn stop(&mut self) {
        self.state = CountdownState::Stopped;
    }
}

/// 启动秒级时钟任务
///
/// 第一次 tick 在一个周期之后；接收方关闭后任务自行退出
pub fn spawn_clock<E, F>(
    period: std::time::Duration,
    tx: tokio::sync::mpsc::Sender<E>,
    make: F,
) -> tokio::task::JoinHandle<()>
where
    E: Send + 'static,
    F: Fn() -> E + Send + 'static,
{
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + period;
        let mut ticker = tokio::time::interval_at(start, period);
        loop {
            ticker.tick().await;
            if tx.send(make()).await.is_err() {
                break;
            }
        }
        tracing::debug!("⏹ 倒计时时钟已停止");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_clock_emits_once_per_period() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(8);
        let started = tokio::time::Instant::now();
        let handle = spawn_clock(std::time::Duration::from_secs(1), tx, || ());

        rx.recv().await.unwrap();
        assert_eq!(started.elapsed(), std::time::Duration::from_secs(1));
        rx.recv().await.unwrap();
        assert_eq!(started.elapsed(), std::time::Duration::from_secs(2));

        drop(rx);
        handle.await.unwrap();
    }

    #[test]
    fn test_reaches_zero_after_exact_ticks() {
        let mut countdown = Countdown::new(1800);
        let mut expired = 0;
        for _ in 0..1800 {
            if countdown.tick(false) == TickOutcome::Expired {
                expired += 1;
            }
        }
        assert_eq!(countdown.remaining(), 0);
        assert_eq!(expired, 1);
        assert_eq!(countdown.tick(false), TickOutcome::Idle);
    }

    #[test]
    fn test_frozen_and_stopped_do_not_decrement() {
        let mut countdown = Countdown::new(10);
        assert_eq!(countdown.tick(true), TickOutcome::Idle);
        assert_eq!(countdown.tick(false), TickOutcome::Ticked { remaining: 9 });
        countdown.stop();
        assert_eq!(countdown.tick(false), TickOutcome::Idle);
        assert_eq!(countdown.remaining(), 9);
        assert_eq!(countdown.state(), CountdownState::Stopped);
    }
}
