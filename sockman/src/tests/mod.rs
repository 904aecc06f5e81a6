mod handoff;
mod queue;
mod sockopt;
