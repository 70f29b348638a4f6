mod batch;
mod session;
