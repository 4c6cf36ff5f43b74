//! sqlx support for the text-backed domain enums.
//!
//! Each enum is stored in a TEXT column (guarded by a CHECK constraint) using
//! its `as_str()` spelling, and decoded through its `FromStr` impl.

use crate::attachment::AttachmentKind;
use crate::customer::BuildingType;
use crate::project_status::ProjectStatus;
use crate::roles::Role;

macro_rules! text_enum {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl sqlx::Type<sqlx::Postgres> for $ty {
                fn type_info() -> sqlx::postgres::PgTypeInfo {
                    <String as sqlx::Type<sqlx::Postgres>>::type_info()
                }

                fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                    <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
                }
            }

            impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
                fn decode(
                    value: sqlx::postgres::PgValueRef<'r>,
                ) -> Result<Self, sqlx::error::BoxDynError> {
                    let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                    Ok(s.parse::<$ty>()?)
                }
            }

            impl sqlx::Encode<'_, sqlx::Postgres> for $ty {
                fn encode_by_ref(
                    &self,
                    buf: &mut sqlx::postgres::PgArgumentBuffer,
                ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                    <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
                }
            }
        )+
    };
}

text_enum!(Role, ProjectStatus, BuildingType, AttachmentKind);
