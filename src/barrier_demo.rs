//! `simple-mpi`: barriers, a nested call chain and a slow rank 0.
//!
//! Every participant walks the same path:
//!
//! ```text
//! Init -> Sleeping (rank 0) | Idle (others) -> BarrierWait1 -> LevelOnePrint
//!      -> BarrierWait2 -> LevelTwoPrint -> FinalPrint -> Finalized
//! ```
//!
//! Rank 0 sleeps before the first barrier, so every other rank sits in
//! `BarrierWait1` until it is done. `in level 1` is printed by all ranks before
//! the second barrier, so no rank prints `in level 2` before every rank has
//! printed `in level 1`.

use std::fmt;
use std::io::Write;
use std::thread;

use crate::config::{DemoConfig, SLEEP_TICKS};
use crate::console;
use crate::error::{Error, Result};
use crate::group::{ProcessContext, ProcessGroup};

/// Where a participant is in the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Joined the group, nothing printed yet.
    Init,
    /// Rank 0 only: printing the tick lines.
    Sleeping,
    /// Ranks other than 0 before the first barrier.
    Idle,
    /// Inside the first barrier.
    BarrierWait1,
    /// Printing `in level 1`.
    LevelOnePrint,
    /// Inside the second barrier, called from level one.
    BarrierWait2,
    /// Printing `in level 2`.
    LevelTwoPrint,
    /// Printing rank, size and `var`.
    FinalPrint,
    /// Left the group.
    Finalized,
}

impl Phase {
    /// Whether `next` may directly follow `self`.
    pub fn can_advance_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Init, Sleeping)
                | (Init, Idle)
                | (Sleeping, BarrierWait1)
                | (Idle, BarrierWait1)
                | (BarrierWait1, LevelOnePrint)
                | (LevelOnePrint, BarrierWait2)
                | (BarrierWait2, LevelTwoPrint)
                | (LevelTwoPrint, FinalPrint)
                | (FinalPrint, Finalized)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Tracks one participant's phase and the path it took.
#[derive(Debug)]
pub struct Participant {
    ctx: ProcessContext,
    phase: Phase,
    path: Vec<Phase>,
}

impl Participant {
    /// A participant in `Init`.
    pub fn new(ctx: ProcessContext) -> Self {
        Participant {
            ctx,
            phase: Phase::Init,
            path: vec![Phase::Init],
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Every phase visited so far, starting with `Init`.
    pub fn path(&self) -> &[Phase] {
        &self.path
    }

    /// The rank and size this participant was created with.
    pub fn context(&self) -> ProcessContext {
        self.ctx
    }

    /// Move to `next`, rejecting transitions outside the state machine.
    pub fn advance(&mut self, next: Phase) -> Result<()> {
        if !self.phase.can_advance_to(next) {
            return Err(Error::Internal(format!(
                "rank {}: illegal transition {} -> {}",
                self.ctx.rank, self.phase, next
            )));
        }
        tracing::trace!(rank = self.ctx.rank, from = %self.phase, to = %next, "phase");
        self.phase = next;
        self.path.push(next);
        Ok(())
    }
}

/// `10 × rank`, the value each participant prints last.
pub fn computed_value(rank: i32) -> f32 {
    10.0 * rank as f32
}

/// Run the demo for one participant and return it in `FinalPrint`.
///
/// The caller moves it to `Finalized` once it has left the group.
pub fn run<G, W>(group: &G, config: &DemoConfig, out: &mut W) -> Result<Participant>
where
    G: ProcessGroup + ?Sized,
    W: Write + ?Sized,
{
    let ctx = group.context();
    let span = tracing::debug_span!("simple_mpi", rank = ctx.rank, size = ctx.group_size);
    let _enter = span.enter();

    let mut me = Participant::new(ctx);
    let var = computed_value(ctx.rank);

    if ctx.is_root() {
        me.advance(Phase::Sleeping)?;
        sleep_loop(config, out);
    } else {
        me.advance(Phase::Idle)?;
    }

    me.advance(Phase::BarrierWait1)?;
    group.barrier()?;
    tracing::debug!("passed first barrier");

    level_one(group, &mut me, out)?;

    me.advance(Phase::FinalPrint)?;
    console::emit(
        out,
        &format!("internal process: {} of {}", ctx.rank, ctx.group_size),
    );
    console::emit(out, &format!("var = {var}"));
    Ok(me)
}

/// Rank 0's start message and one `<i> s...` line per tick.
fn sleep_loop<W: Write + ?Sized>(config: &DemoConfig, out: &mut W) {
    console::emit(out, "process 0 sleeping for 3s...");
    for i in 0..SLEEP_TICKS {
        thread::sleep(config.tick);
        console::emit(out, &format!("{i} s..."));
    }
}

fn level_one<G, W>(group: &G, me: &mut Participant, out: &mut W) -> Result<()>
where
    G: ProcessGroup + ?Sized,
    W: Write + ?Sized,
{
    me.advance(Phase::LevelOnePrint)?;
    console::emit(out, "in level 1");

    me.advance(Phase::BarrierWait2)?;
    group.barrier()?;
    tracing::debug!("passed second barrier");

    level_two(me, out)
}

fn level_two<W: Write + ?Sized>(me: &mut Participant, out: &mut W) -> Result<()> {
    me.advance(Phase::LevelTwoPrint)?;
    console::emit(out, "in level 2");
    Ok(())
}
