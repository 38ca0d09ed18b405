//! [`FakeMachine`]: a scriptable stand-in for the live system.
//!
//! It understands the `hostnamectl`, `timedatectl`, `localectl`, `uname`,
//! `uptime`, `systemctl` and `pacman` invocations issued by
//! `horizon_state::LiveSystem` and answers them from in-memory state.
//! Mutating commands change that state, so a restore followed by a check
//! behaves like it would on a real machine.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use horizon_state::{CommandExecutor, CommandOutput, Error, LiveSystem, Result, SystemCommand};

/// How commands of a broken program fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// The program runs and exits with status 1
    Exit,
    /// The program cannot be started
    Spawn,
    /// The program never finishes within its timeout
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Service {
    enabled: bool,
    active: bool,
}

#[derive(Debug, Clone)]
struct MachineState {
    hostname: String,
    timezone: String,
    locale: String,
    kernel: String,
    services: BTreeMap<String, Service>,
    packages: BTreeSet<String>,
}

/// In-memory machine implementing [`CommandExecutor`].
#[derive(Debug)]
pub struct FakeMachine {
    state: Mutex<MachineState>,
    failures: Mutex<HashMap<String, Failure>>,
    log: Mutex<Vec<SystemCommand>>,
}

impl Default for FakeMachine {
    fn default() -> Self {
        Self::new("horizon-test")
    }
}

const MUTATING: &[&str] = &["set-hostname", "set-timezone", "start", "stop"];

impl FakeMachine {
    /// A machine with the given hostname, UTC, no services and no packages.
    pub fn new(hostname: &str) -> Self {
        Self {
            state: Mutex::new(MachineState {
                hostname: hostname.to_string(),
                timezone: "UTC".to_string(),
                locale: "en_US.UTF-8".to_string(),
                kernel: "6.10.4-horizon".to_string(),
                services: BTreeMap::new(),
                packages: BTreeSet::new(),
            }),
            failures: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MachineState> {
        self.state.lock().unwrap()
    }

    pub fn with_timezone(self, timezone: &str) -> Self {
        self.state().timezone = timezone.to_string();
        self
    }

    pub fn with_service(self, name: &str, enabled: bool, active: bool) -> Self {
        self.state()
            .services
            .insert(name.to_string(), Service { enabled, active });
        self
    }

    pub fn with_packages(self, names: &[&str]) -> Self {
        self.state()
            .packages
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    /// Wrap the machine for use by the state managers.
    pub fn live(self: &Arc<Self>) -> LiveSystem {
        LiveSystem::new(Arc::clone(self) as Arc<dyn CommandExecutor>, Duration::from_secs(5))
    }

    /// Make every command of `program` fail.
    pub fn break_program(&self, program: &str, failure: Failure) {
        self.failures
            .lock()
            .unwrap()
            .insert(program.to_string(), failure);
    }

    pub fn repair_program(&self, program: &str) {
        self.failures.lock().unwrap().remove(program);
    }

    pub fn hostname(&self) -> String {
        self.state().hostname.clone()
    }

    pub fn timezone(&self) -> String {
        self.state().timezone.clone()
    }

    pub fn set_hostname(&self, hostname: &str) {
        self.state().hostname = hostname.to_string();
    }

    pub fn set_timezone(&self, timezone: &str) {
        self.state().timezone = timezone.to_string();
    }

    /// `None` if the service is unknown.
    pub fn service(&self, name: &str) -> Option<(bool, bool)> {
        self.state()
            .services
            .get(name)
            .map(|s| (s.enabled, s.active))
    }

    pub fn set_service(&self, name: &str, enabled: bool, active: bool) {
        self.state()
            .services
            .insert(name.to_string(), Service { enabled, active });
    }

    pub fn set_service_active(&self, name: &str, active: bool) {
        if let Some(service) = self.state().services.get_mut(name) {
            service.active = active;
        }
    }

    pub fn remove_package(&self, name: &str) {
        self.state().packages.remove(name);
    }

    /// Every command run so far, in order.
    pub fn commands(&self) -> Vec<SystemCommand> {
        self.log.lock().unwrap().clone()
    }

    /// Commands that changed the machine.
    pub fn mutations(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| c.args.first().is_some_and(|a| MUTATING.contains(&a.as_str())))
            .map(|c| c.to_string())
            .collect()
    }

    fn answer(&self, program: &str, args: &[&str]) -> CommandOutput {
        let mut state = self.state();
        match (program, args) {
            ("hostnamectl", ["hostname"]) => CommandOutput::ok(format!("{}\n", state.hostname)),
            ("hostnamectl", ["set-hostname", name]) => {
                state.hostname = name.to_string();
                CommandOutput::ok("")
            }
            ("timedatectl", ["show", "--property=Timezone", "--value"]) => {
                CommandOutput::ok(format!("{}\n", state.timezone))
            }
            ("timedatectl", ["set-timezone", zone]) => {
                state.timezone = zone.to_string();
                CommandOutput::ok("")
            }
            ("localectl", ["status"]) => CommandOutput::ok(format!(
                "   System Locale: LANG={}\n       VC Keymap: us\n      X11 Layout: us\n",
                state.locale
            )),
            ("uname", ["-r"]) => CommandOutput::ok(format!("{}\n", state.kernel)),
            ("uptime", ["-p"]) => CommandOutput::ok("up 3 hours, 12 minutes\n"),
            ("systemctl", ["is-enabled", name]) => match state.services.get(*name) {
                Some(s) if s.enabled => CommandOutput::ok("enabled\n"),
                Some(_) => CommandOutput {
                    stdout: "disabled\n".to_string(),
                    stderr: String::new(),
                    exit_code: 1,
                },
                None => CommandOutput::failed(
                    1,
                    format!("Failed to get unit file state for {name}.service: No such file or directory\n"),
                ),
            },
            ("systemctl", ["list-units", ..]) => {
                let listing: String = state
                    .services
                    .iter()
                    .map(|(name, s)| {
                        let (active, sub) = if s.active {
                            ("active", "running")
                        } else {
                            ("inactive", "dead")
                        };
                        format!("{name}.service loaded {active} {sub} {name} service\n")
                    })
                    .collect();
                CommandOutput::ok(listing)
            }
            ("systemctl", [verb @ ("start" | "stop"), name]) => match state.services.get_mut(*name) {
                Some(service) => {
                    service.active = *verb == "start";
                    CommandOutput::ok("")
                }
                None => CommandOutput::failed(5, format!("Failed to {verb} {name}.service: Unit {name}.service not found.\n")),
            },
            ("pacman", ["-Qq"]) => {
                let listing: String = state.packages.iter().map(|p| format!("{p}\n")).collect();
                CommandOutput::ok(listing)
            }
            _ => CommandOutput::failed(127, format!("{program}: unsupported invocation\n")),
        }
    }
}

#[async_trait]
impl CommandExecutor for FakeMachine {
    async fn run(&self, command: &SystemCommand, timeout: Duration) -> Result<CommandOutput> {
        self.log.lock().unwrap().push(command.clone());

        let failure = self.failures.lock().unwrap().get(&command.program).copied();
        match failure {
            Some(Failure::Exit) => {
                return Ok(CommandOutput::failed(1, format!("{}: simulated failure", command.program)));
            }
            Some(Failure::Spawn) => {
                return Err(Error::CommandSpawn {
                    command: command.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "simulated"),
                });
            }
            Some(Failure::Timeout) => {
                return Err(Error::CommandTimeout {
                    command: command.to_string(),
                    timeout,
                });
            }
            None => {}
        }

        let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
        Ok(self.answer(&command.program, &args))
    }
}
