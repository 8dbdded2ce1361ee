//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements          | Connects to                     |
//! |------------|---------------------|---------------------------------|
//! | `uio`      | DevicePort          | `/sys/class/uio`, `/dev/uioN`   |
//! |            | NotifyHandle        |                                 |
//! |            | RegisterWindow      | `mmap`ed register maps          |
//! | `poll`     | Multiplexer         | `poll(2)`                       |
//! | `delay`    | DelayNs             | `thread::sleep`                 |
//! | `log_sink` | EventSink           | `log` facade                    |

pub mod delay;
pub mod log_sink;
pub mod poll;
pub mod uio;
