pub mod clock;
pub use clock::{Clock, FixedClock, SystemClock};

pub mod token;
pub use token::{Claims, TokenError, TokenIssuer};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult};
pub use auth_service_impl::TokenAuthService;

pub mod habit_service;
pub mod habit_service_impl;
pub use habit_service::{HabitError, HabitService, HabitStats, NewHabit};
pub use habit_service_impl::InMemoryHabitService;
