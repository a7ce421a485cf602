/// Implements `Wire` for a plain struct so it travels as a named record.
///
/// The struct must implement `Default`: decoding materializes an empty value
/// and then assigns each field found on the wire. Unknown fields are skipped
/// and absent fields keep their default.
///
/// The type is also submitted for registration, so its supertypes are known
/// to subtype checks before any value of it is seen.
///
/// ```ignore
/// #[derive(Debug, Default, PartialEq)]
/// struct Dog { name: String, good: bool }
///
/// wire_record!(Dog as "Dog" extends ["Animal"] { name, good });
/// ```
#[macro_export]
macro_rules! wire_record {
    ($ty:ty as $class:literal $(extends [$($sup:literal),* $(,)?])? { $($field:ident),* $(,)? }) => {
        $crate::inventory::submit! {
            $crate::schema::RecordReg { register: $crate::schema::register::<$ty> }
        }

        impl $crate::Wire for $ty {
            fn type_ref() -> $crate::TypeRef {
                $crate::TypeRef::Class($class.to_string())
            }

            fn describe() -> $crate::Schema {
                $crate::Schema::record::<Self>(
                    $class,
                    &[$(stringify!($field)),*],
                    &[$($($sup),*)?],
                )
            }

            #[allow(unused_mut)]
            fn to_value(&self) -> $crate::Value {
                let mut record = $crate::Record::new($class);
                $(record.fields.push((
                    stringify!($field).to_string(),
                    $crate::Wire::to_value(&self.$field),
                ));)*
                $crate::Value::Record(record)
            }

            #[allow(unused_mut, unused_variables)]
            fn from_value(value: $crate::Value) -> $crate::Result<Self> {
                let record = $crate::value::expect_record(value, $class)?;
                let mut out = <Self as ::core::default::Default>::default();
                for (name, field) in record.fields {
                    match name.as_str() {
                        $(stringify!($field) => out.$field = $crate::Wire::from_value(field)?,)*
                        _ => {}
                    }
                }
                Ok(out)
            }
        }
    };
}
