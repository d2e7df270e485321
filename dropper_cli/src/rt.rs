//! Real-time scheduling for the poll loop (Linux SCHED_FIFO / affinity / mlockall).
//!
//! Release jitter equals the poll interval, so every preemption of the loop
//! shifts a drop. All steps are best effort: failures are logged and the run
//! continues without them.

use crate::cli::RtLock;

#[derive(Debug, Clone, Copy)]
pub struct RtRequest {
    pub prio: Option<i32>,
    pub lock: RtLock,
    pub cpu: Option<usize>,
}

#[cfg(unix)]
fn os_result(rc: libc::c_int) -> std::io::Result<()> {
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(unix)]
fn apply_mem_lock(lock: RtLock) -> eyre::Result<()> {
    use libc::{MCL_CURRENT, MCL_FUTURE, mlockall};

    fn memlock_limit_hint() -> Option<String> {
        let mut rlim = std::mem::MaybeUninit::<libc::rlimit>::uninit();
        // SAFETY: getrlimit fills the struct when it returns 0.
        let rc = unsafe { libc::getrlimit(libc::RLIMIT_MEMLOCK, rlim.as_mut_ptr()) };
        if rc != 0 {
            return None;
        }
        // SAFETY: initialized by the successful call above.
        let cur = unsafe { rlim.assume_init() }.rlim_cur;
        if cur == libc::RLIM_INFINITY {
            Some("memlock limit: unlimited".to_string())
        } else {
            Some(format!("memlock limit: {} KiB", cur / 1024))
        }
    }

    let flags = match lock {
        RtLock::None => return Ok(()),
        RtLock::Current => MCL_CURRENT,
        RtLock::All => MCL_CURRENT | MCL_FUTURE,
    };
    // SAFETY: mlockall has no memory safety preconditions.
    let mut result = os_result(unsafe { mlockall(flags) });

    // All pages may exceed the memlock limit where current pages fit.
    let retry = lock == RtLock::All
        && matches!(
            result.as_ref().err().and_then(std::io::Error::raw_os_error),
            Some(libc::EPERM | libc::ENOMEM)
        );
    if retry {
        // SAFETY: as above.
        result = os_result(unsafe { mlockall(MCL_CURRENT) });
        if result.is_ok() {
            tracing::warn!("mlockall(current|future) refused, locked current pages only");
        }
    }

    result.map_err(|e| {
        let mut msg = format!("mlockall failed: {e}");
        if matches!(e.raw_os_error(), Some(libc::EPERM | libc::ENOMEM)) {
            if let Some(h) = memlock_limit_hint() {
                msg.push_str(&format!("; {h}"));
            }
            msg.push_str("; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'");
        }
        eyre::eyre!(msg)
    })
}

#[cfg(target_os = "linux")]
fn apply_fifo_priority(prio: Option<i32>) -> eyre::Result<i32> {
    use libc::{SCHED_FIFO, sched_get_priority_max, sched_get_priority_min, sched_param};

    // SAFETY: plain queries without pointers.
    let (min, max) = unsafe { (sched_get_priority_min(SCHED_FIFO), sched_get_priority_max(SCHED_FIFO)) };
    let (min, max) = if min < 0 || max < 0 { (1, 99) } else { (min, max) };
    let prio = prio.unwrap_or(max).clamp(min, max);
    let param = sched_param {
        sched_priority: prio,
    };
    // SAFETY: `param` outlives the call.
    os_result(unsafe { libc::sched_setscheduler(0, SCHED_FIFO, &param) }).map_err(|e| {
        eyre::eyre!(
            "sched_setscheduler(SCHED_FIFO, {prio}) failed: {e}; hint: needs CAP_SYS_NICE or root \
             (e.g. 'sudo setcap cap_sys_nice=ep /path/to/dropper')"
        )
    })?;
    Ok(prio)
}

#[cfg(target_os = "linux")]
fn apply_affinity(cpu: usize) -> eyre::Result<()> {
    let capacity = std::mem::size_of::<libc::cpu_set_t>() * 8;
    if cpu >= capacity {
        eyre::bail!("requested CPU {cpu} exceeds cpu_set_t capacity {capacity}");
    }
    // SAFETY: cpu_set_t is plain data; all-zero is a valid empty set.
    let mut allowed: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    // SAFETY: `allowed` is a valid, writable cpu_set_t of the given size.
    os_result(unsafe {
        libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut allowed)
    })?;
    // SAFETY: `cpu` is below the set capacity.
    if !unsafe { libc::CPU_ISSET(cpu, &allowed) } {
        eyre::bail!("CPU {cpu} not permitted by current affinity mask");
    }
    // SAFETY: as above.
    let mut desired: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    // SAFETY: `cpu` is below the set capacity.
    unsafe { libc::CPU_SET(cpu, &mut desired) };
    // SAFETY: `desired` is a valid cpu_set_t of the given size.
    os_result(unsafe {
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &desired)
    })?;
    Ok(())
}

/// Apply the requested real-time settings once per process.
pub fn setup_rt_once(req: &RtRequest) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    RT_ONCE.get_or_init(|| {
        #[cfg(unix)]
        {
            match apply_mem_lock(req.lock) {
                Ok(()) => tracing::info!(lock = ?req.lock, "rt: memory lock applied"),
                Err(err) => tracing::warn!(error = %err, "rt: memory lock not applied"),
            }
        }

        #[cfg(target_os = "linux")]
        {
            match apply_fifo_priority(req.prio) {
                Ok(prio) => tracing::info!(prio, "rt: SCHED_FIFO"),
                Err(err) => tracing::warn!(error = %err, "rt: priority not applied"),
            }
            let cpu = req.cpu.unwrap_or(0);
            match apply_affinity(cpu) {
                Ok(()) => tracing::info!(cpu, "rt: pinned"),
                Err(err) => tracing::warn!(error = %err, cpu, "rt: affinity not applied"),
            }
        }
        #[cfg(not(target_os = "linux"))]
        tracing::warn!(
            prio = ?req.prio,
            cpu = ?req.cpu,
            "rt: SCHED_FIFO and affinity are Linux only; only memory locking attempted"
        );
    });
}
