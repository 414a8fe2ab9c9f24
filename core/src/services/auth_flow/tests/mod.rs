
mod resend_tests;
