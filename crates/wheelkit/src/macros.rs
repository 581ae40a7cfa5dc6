#[macro_export]
macro_rules! impl_string_newtype {
    ($name:ty) => {
        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}

#[macro_export]
macro_rules! impl_random_id {
    ($name:ty) => {
        impl $name {
            pub fn random() -> Self {
                Self(rand::random())
            }
        }
    };
}
